mod aliases;
mod utils;
