#![allow(missing_docs)]

use std::sync::Arc;

use charstream::{AliasRegistry, InputStream, StreamOptions};

pub fn stream(charset: &str) -> InputStream {
    InputStream::new(
        Arc::new(AliasRegistry::builtin()),
        StreamOptions {
            encoding: Some(charset.into()),
            ..Default::default()
        },
        None,
    )
    .expect("charset is registered")
}
