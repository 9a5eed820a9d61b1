//! テスト共通ユーティリティ

#![allow(dead_code)]

pub mod agent;
pub mod http;
