#![allow(clippy::doc_markdown, clippy::use_self)]
pub mod builder;
pub mod logger;
pub mod provisioner;
pub mod resource_recorder;
pub mod runtime;
