pub mod helix;
pub mod oauth;
pub mod request; // 401リフレッシュ・リトライラッパー
