// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue types: numbering prefix, display name, and average service time.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A named category of service with its own numbering sequence.
///
/// Declaration order is the assignment priority order: when several queues
/// have eligible tickets in the same tick, earlier variants win the advisor.
/// Variants are declared in assignment priority order, which `Ord` follows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum QueueType {
    Caja,
    #[strum(to_string = "PERSONAL_BANKER", serialize = "PERSONAL")]
    #[serde(alias = "PERSONAL")]
    PersonalBanker,
    Empresas,
    Gerencia,
}

impl QueueType {
    /// Every queue type, in priority order.
    pub const ALL: [QueueType; 4] = [
        QueueType::Caja,
        QueueType::PersonalBanker,
        QueueType::Empresas,
        QueueType::Gerencia,
    ];

    pub fn prefix(self) -> char {
        match self {
            QueueType::Caja => 'C',
            QueueType::PersonalBanker => 'P',
            QueueType::Empresas => 'E',
            QueueType::Gerencia => 'G',
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            QueueType::Caja => "Caja",
            QueueType::PersonalBanker => "Personal Banker",
            QueueType::Empresas => "Empresas",
            QueueType::Gerencia => "Gerencia",
        }
    }

    pub fn avg_service_minutes(self) -> u32 {
        match self {
            QueueType::Caja => 5,
            QueueType::PersonalBanker => 15,
            QueueType::Empresas => 20,
            QueueType::Gerencia => 30,
        }
    }

    /// Estimated wait for a ticket at the given 1-based position.
    pub fn eta_minutes(self, position: u32) -> u32 {
        position.saturating_mul(self.avg_service_minutes())
    }

    /// Human-readable ticket number: prefix plus a sequence padded to two digits.
    pub fn format_number(self, sequence: u32) -> String {
        format!("{}{:02}", self.prefix(), sequence)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn numbers_are_prefixed_and_padded() {
        assert_eq!(QueueType::Caja.format_number(1), "C01");
        assert_eq!(QueueType::Gerencia.format_number(10), "G10");
        assert_eq!(QueueType::Empresas.format_number(100), "E100");
    }

    #[test]
    fn prefixes_are_distinct() {
        let mut prefixes: Vec<char> = QueueType::ALL.iter().map(|q| q.prefix()).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), QueueType::ALL.len());
    }

    #[test]
    fn parse_is_case_insensitive_and_accepts_alias() {
        assert_eq!(QueueType::from_str("caja").unwrap(), QueueType::Caja);
        assert_eq!(
            QueueType::from_str("PERSONAL").unwrap(),
            QueueType::PersonalBanker
        );
        assert_eq!(
            QueueType::from_str("personal_banker").unwrap(),
            QueueType::PersonalBanker
        );
        assert!(QueueType::from_str("VIP").is_err());
    }

    #[test]
    fn display_uses_wire_name() {
        assert_eq!(QueueType::PersonalBanker.to_string(), "PERSONAL_BANKER");
        assert_eq!(QueueType::Caja.to_string(), "CAJA");
    }

    #[test]
    fn serde_wire_names() {
        let json = serde_json::to_string(&QueueType::PersonalBanker).unwrap();
        assert_eq!(json, "\"PERSONAL_BANKER\"");
        let parsed: QueueType = serde_json::from_str("\"PERSONAL\"").unwrap();
        assert_eq!(parsed, QueueType::PersonalBanker);
    }

    #[test]
    fn ordering_follows_priority() {
        let mut queues = vec![QueueType::Gerencia, QueueType::Caja, QueueType::Empresas];
        queues.sort();
        assert_eq!(
            queues,
            vec![QueueType::Caja, QueueType::Empresas, QueueType::Gerencia]
        );
    }

    #[test]
    fn eta_scales_with_position() {
        assert_eq!(QueueType::Caja.eta_minutes(4), 20);
        assert_eq!(QueueType::Gerencia.eta_minutes(0), 0);
    }
}
