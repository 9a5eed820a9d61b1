//! Test Agent Common
//!
//! エージェントとドライバー（テストオーケストレーター）で共有する型定義

#![warn(missing_docs)]

/// 設定構造体と読み込み
pub mod config;

/// エラー型（thiserror使用）
pub mod error;

/// RPCリクエスト/レスポンス定義
pub mod protocol;

/// 共通の値型
pub mod types;
