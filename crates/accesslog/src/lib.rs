// Apache access log extraction: format compiler, line pipeline, and runner.

pub mod parser;
pub mod conf;
pub mod runtime;
