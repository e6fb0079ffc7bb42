// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Survey phase derivation.
//!
//! The phase is never stored. It is recomputed from the turn counts of the
//! conversation every time a message arrives, so the engine itself holds no
//! state between turns.

use pitstop_core::Conversation;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Assistant turns after which the survey is over.
pub const MAX_ASSISTANT_TURNS: usize = 6;

/// Customer replies that end the survey.
pub const MAX_CUSTOMER_TURNS: usize = 6;

/// Where a conversation stands. Variants are declared in survey order.
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
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SurveyPhase {
    OverallSatisfaction,
    WorkmanshipQuality,
    ServiceTimeliness,
    StaffFriendliness,
    FollowUp,
    StaffRecognition,
    AdditionalInfo,
    Complete,
}

impl SurveyPhase {
    pub fn is_terminal(self) -> bool {
        self == SurveyPhase::Complete
    }

    /// The phase whose question follows this one. `Complete` maps to itself.
    pub fn next(self) -> SurveyPhase {
        match self {
            SurveyPhase::OverallSatisfaction => SurveyPhase::WorkmanshipQuality,
            SurveyPhase::WorkmanshipQuality => SurveyPhase::ServiceTimeliness,
            SurveyPhase::ServiceTimeliness => SurveyPhase::StaffFriendliness,
            SurveyPhase::StaffFriendliness => SurveyPhase::FollowUp,
            SurveyPhase::FollowUp => SurveyPhase::StaffRecognition,
            SurveyPhase::StaffRecognition => SurveyPhase::AdditionalInfo,
            SurveyPhase::AdditionalInfo | SurveyPhase::Complete => SurveyPhase::Complete,
        }
    }
}

/// Derives the phase from turn counts alone. Message content never matters.
pub fn phase_of(conversation: &Conversation) -> SurveyPhase {
    let assistant = conversation.assistant_turns();
    let customer = conversation.customer_turns();

    if assistant > MAX_ASSISTANT_TURNS || customer >= MAX_CUSTOMER_TURNS {
        return SurveyPhase::Complete;
    }

    match assistant {
        1 => SurveyPhase::OverallSatisfaction,
        2 => SurveyPhase::WorkmanshipQuality,
        3 => SurveyPhase::ServiceTimeliness,
        4 => SurveyPhase::StaffFriendliness,
        5 => SurveyPhase::FollowUp,
        6 => SurveyPhase::StaffRecognition,
        _ => SurveyPhase::AdditionalInfo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn with_counts(assistant: usize, customer: usize) -> Conversation {
        let mut c = Conversation::new();
        for i in 0..assistant.max(customer) {
            if i < assistant {
                c.push_assistant(format!("q{i}"));
            }
            if i < customer {
                c.push_customer(format!("a{i}"));
            }
        }
        c
    }

    #[test]
    fn count_table() {
        let expected = [
            (0, SurveyPhase::AdditionalInfo),
            (1, SurveyPhase::OverallSatisfaction),
            (2, SurveyPhase::WorkmanshipQuality),
            (3, SurveyPhase::ServiceTimeliness),
            (4, SurveyPhase::StaffFriendliness),
            (5, SurveyPhase::FollowUp),
            (6, SurveyPhase::StaffRecognition),
            (7, SurveyPhase::Complete),
        ];
        for (assistant, phase) in expected {
            assert_eq!(phase_of(&with_counts(assistant, 0)), phase, "{assistant} turns");
        }
    }

    #[test]
    fn six_customer_turns_complete() {
        assert_eq!(phase_of(&with_counts(2, 6)), SurveyPhase::Complete);
        assert_eq!(phase_of(&with_counts(2, 5)), SurveyPhase::WorkmanshipQuality);
    }

    #[test]
    fn content_is_ignored() {
        let mut c = Conversation::seeded("How satisfied were you?");
        c.push_customer("I'm done, stop texting me");
        assert_eq!(phase_of(&c), SurveyPhase::OverallSatisfaction);
    }

    #[test]
    fn wire_names() {
        assert_eq!(SurveyPhase::StaffFriendliness.to_string(), "staff_friendliness");
        assert_eq!(
            SurveyPhase::from_str("follow_up").unwrap(),
            SurveyPhase::FollowUp
        );
    }

    #[test]
    fn next_walks_the_script() {
        assert_eq!(SurveyPhase::OverallSatisfaction.next(), SurveyPhase::WorkmanshipQuality);
        assert_eq!(SurveyPhase::FollowUp.next(), SurveyPhase::StaffRecognition);
        assert_eq!(SurveyPhase::Complete.next(), SurveyPhase::Complete);
        assert!(SurveyPhase::Complete.is_terminal());
    }

    proptest! {
        #[test]
        fn phase_never_moves_backwards(appends in proptest::collection::vec(any::<bool>(), 0..30)) {
            let mut c = Conversation::seeded("greeting");
            let mut previous = phase_of(&c);
            for assistant in appends {
                if assistant {
                    c.push_assistant("q");
                } else {
                    c.push_customer("a");
                }
                let current = phase_of(&c);
                prop_assert!(current >= previous, "{previous} -> {current}");
                previous = current;
            }
        }
    }
}
