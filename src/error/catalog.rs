//! Localized messages for every wire error code.

use serde::Serialize;
use std::collections::BTreeMap;

use super::ErrorCode;

pub const LANGUAGES: [&str; 3] = ["en", "ru", "uz"];

/// Language tag -> message text, serialized as `{"en": .., "ru": .., "uz": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Messages(BTreeMap<String, String>);

impl Messages {
    /// Texts in the order of [`LANGUAGES`].
    fn from_texts(texts: [&str; 3]) -> Self {
        Self(
            LANGUAGES
                .iter()
                .zip(texts)
                .map(|(lang, text)| (lang.to_string(), text.to_string()))
                .collect(),
        )
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ErrorCatalog {
    entries: BTreeMap<i32, Messages>,
    fallback: Messages,
}

impl ErrorCatalog {
    pub fn new(entries: BTreeMap<i32, Messages>, fallback: Messages) -> Self {
        Self { entries, fallback }
    }

    /// Messages for a raw wire code; unknown codes get the generic fallback.
    pub fn messages(&self, code: i32) -> &Messages {
        self.entries.get(&code).unwrap_or(&self.fallback)
    }

    pub fn messages_for(&self, code: ErrorCode) -> &Messages {
        self.messages(code.code())
    }
}

impl Default for ErrorCatalog {
    fn default() -> Self {
        let table: [(ErrorCode, [&str; 3]); 6] = [
            (
                ErrorCode::InvalidAmount,
                [
                    "Invalid amount",
                    "Неверная сумма",
                    "Noto‘g‘ri miqdor",
                ],
            ),
            (
                ErrorCode::TransactionNotFound,
                [
                    "Transaction not found",
                    "Транзакция не найдена",
                    "Tranzaksiya topilmadi",
                ],
            ),
            (
                ErrorCode::OperationFailed,
                [
                    "Unable to perform this operation",
                    "Невозможно выполнить данную операцию",
                    "Bu amalni bajarib bo‘lmaydi",
                ],
            ),
            (
                ErrorCode::InvalidAccount,
                [
                    "Invalid account or transaction not found",
                    "Неверный аккаунт или транзакция не найдена",
                    "Noto‘g‘ri akkaunt yoki tranzaksiya topilmadi",
                ],
            ),
            (
                ErrorCode::TransactionIdConflict,
                [
                    "Transaction already exists with different ID",
                    "Транзакция уже существует с другим ID",
                    "Tranzaksiya allaqachon boshqa ID bilan mavjud",
                ],
            ),
            (
                ErrorCode::MalformedRequest,
                [
                    "Invalid request format",
                    "Неверный формат запроса",
                    "So‘rov formati noto‘g‘ri",
                ],
            ),
        ];

        let entries = table
            .iter()
            .map(|(code, texts)| (code.code(), Messages::from_texts(*texts)))
            .collect();

        let fallback = Messages::from_texts([
            "Unknown error",
            "Неизвестная ошибка",
            "Noma’lum xato",
        ]);

        Self::new(entries, fallback)
    }
}
