#![allow(dead_code)]

pub mod stream_server;
