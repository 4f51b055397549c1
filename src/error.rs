/*
 * Responsibility
 * - ライブラリ共通の CasError 定義 (構築時のエラーのみ)
 * - チケット検証の失敗はここに含めない (ValidationOutcome で返す)
 * - 設定値の不備は ConfigError (config.rs) 側
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CasError {
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
