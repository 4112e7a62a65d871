//! テーマとスタイルヘルパー

use crate::api::helix::PredictionStatus;

/// ステータスバッジの背景色
pub fn status_color(status: PredictionStatus) -> &'static str {
    match status {
        PredictionStatus::Active => "#22c55e",
        PredictionStatus::Locked => "#eab308",
        PredictionStatus::Resolved => "#3b82f6",
        PredictionStatus::Canceled => "#9ca3af",
    }
}

/// 埋め込みCSSを取得
pub fn get_embedded_css() -> &'static str {
    r#"
    * {
        box-sizing: border-box;
    }

    body {
        margin: 0;
        padding: 0;
    }

    .form-group {
        display: flex;
        flex-direction: column;
        gap: 6px;
        margin-bottom: 16px;
    }

    .form-label {
        font-size: 14px;
        font-weight: 600;
        color: #e5e7eb;
    }

    .form-input {
        padding: 10px 12px;
        border: 1px solid rgba(255, 255, 255, 0.2);
        border-radius: 8px;
        background: rgba(255, 255, 255, 0.08);
        color: white;
        font-size: 14px;
        outline: none;
    }

    .form-input:focus {
        border-color: #a970ff;
    }

    .form-hint {
        font-size: 12px;
        color: rgba(255, 255, 255, 0.6);
    }

    .btn {
        padding: 10px 20px;
        border: none;
        border-radius: 8px;
        font-size: 14px;
        font-weight: 600;
        cursor: pointer;
        transition: filter 0.15s ease;
    }

    .btn:hover {
        filter: brightness(1.1);
    }

    .btn-primary {
        background: #a970ff;
        color: white;
    }

    .btn-secondary {
        background: rgba(255, 255, 255, 0.15);
        color: white;
    }

    .btn-danger {
        background: #ef4444;
        color: white;
    }

    .card {
        background: rgba(255, 255, 255, 0.08);
        border: 1px solid rgba(255, 255, 255, 0.15);
        border-radius: 12px;
        padding: 16px;
        margin-bottom: 16px;
    }

    .alert-error {
        background: rgba(239, 68, 68, 0.15);
        border: 1px solid #ef4444;
        color: #fecaca;
        border-radius: 8px;
        padding: 10px 14px;
        margin-bottom: 12px;
        font-size: 14px;
    }

    .alert-success {
        background: rgba(34, 197, 94, 0.15);
        border: 1px solid #22c55e;
        color: #bbf7d0;
        border-radius: 8px;
        padding: 10px 14px;
        margin-bottom: 12px;
        font-size: 14px;
    }
    "#
}
