#![allow(dead_code)]

pub mod datastore;
pub mod dispatcher;
pub mod page_fetcher;
pub mod summarizer;
pub mod transcriber;
