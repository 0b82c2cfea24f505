//! Turning a poll item into a request the platform accepts

use herald_common::PollItem;

use super::{EngineConfig, text};
use crate::{error::TextField, platform::PollRequest};

/// A poll ready to send, plus the text that has to follow it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPoll {
    pub request: PollRequest,
    /// The explanation of a regular poll, sent as its own message
    pub follow_up: Option<String>,
}

/// Build the request for the poll at `index`
///
/// Over-long questions are hard-cut to the limit. Quiz explanations over the
/// limit are cut to `limit - explanation_margin`. The result depends only on
/// the item and the configuration.
pub fn prepare(index: u64, poll: &PollItem, config: &EngineConfig) -> PreparedPoll {
    let limits = &config.limits;

    let question = if config.number_questions {
        format!("Q{}: {}", index + 1, poll.question)
    } else {
        poll.question.clone()
    };
    let question = text::truncate_chars(&question, limits.poll_question_max_chars);

    let (explanation, follow_up) = match poll.correct_option {
        Some(_) => {
            let explanation = poll
                .explanation
                .clone()
                .or_else(|| config.default_explanation.clone())
                .filter(|explanation| !explanation.trim().is_empty())
                .map(|explanation| {
                    if explanation.chars().count() > limits.poll_explanation_max_chars {
                        text::truncate_chars(
                            &explanation,
                            limits
                                .poll_explanation_max_chars
                                .saturating_sub(config.explanation_margin),
                        )
                    } else {
                        explanation
                    }
                });
            (explanation, None)
        }
        None => (
            None,
            poll.explanation
                .clone()
                .filter(|explanation| !explanation.trim().is_empty()),
        ),
    };

    PreparedPoll {
        request: PollRequest {
            question,
            options: poll.options.clone(),
            correct_option: poll.correct_option,
            explanation,
            anonymous: config.anonymous_polls,
        },
        follow_up,
    }
}

/// Shorten the field the platform rejected as too long
///
/// Lengths are measured in UTF-16 code units, the way the platform counts
/// them. Questions and options are cut to their limit, explanations to
/// `limit - explanation_margin`. Returns `false` when there is nothing left
/// to shorten.
pub fn repair(request: &mut PollRequest, field: TextField, config: &EngineConfig) -> bool {
    let limits = &config.limits;

    match field {
        TextField::Question => {
            let repaired = text::truncate_utf16(&request.question, limits.poll_question_max_chars);
            replace(&mut request.question, repaired)
        }
        TextField::Explanation => {
            let Some(explanation) = &request.explanation else {
                return false;
            };
            let repaired = text::truncate_utf16(
                explanation,
                limits
                    .poll_explanation_max_chars
                    .saturating_sub(config.explanation_margin),
            );
            if repaired.trim().is_empty() {
                request.explanation = None;
                return true;
            }
            let changed = repaired != *explanation;
            request.explanation = Some(repaired);
            changed
        }
        TextField::Option => {
            let mut changed = false;
            for option in &mut request.options {
                changed |= replace(
                    option,
                    text::truncate_utf16(option, limits.poll_option_max_chars),
                );
            }
            changed
        }
        TextField::Text => false,
    }
}

fn replace(target: &mut String, repaired: String) -> bool {
    if repaired.is_empty() || repaired == *target {
        return false;
    }
    *target = repaired;
    true
}

#[cfg(test)]
mod tests {
    use herald_common::ChatRef;
    use pretty_assertions::assert_eq;

    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::new(ChatRef::Id(-1_001))
    }

    fn quiz(question: &str, explanation: Option<&str>) -> PollItem {
        PollItem {
            question: question.to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            correct_option: Some(1),
            explanation: explanation.map(str::to_string),
        }
    }

    #[test]
    fn test_question_is_numbered_from_one() {
        let prepared = prepare(0, &quiz("Capital of France?", None), &config());
        assert_eq!(prepared.request.question, "Q1: Capital of France?");
    }

    #[test]
    fn test_numbering_can_be_disabled() {
        let config = EngineConfig {
            number_questions: false,
            ..config()
        };
        let prepared = prepare(4, &quiz("Plain", None), &config);
        assert_eq!(prepared.request.question, "Plain");
    }

    #[test]
    fn test_long_question_is_cut_to_limit() {
        let prepared = prepare(9, &quiz(&"q".repeat(400), None), &config());
        assert_eq!(prepared.request.question.chars().count(), 300);
        assert!(prepared.request.question.starts_with("Q10: "));
    }

    #[test]
    fn test_long_explanation_is_cut_below_limit() {
        let item = quiz("Q", Some(&"e".repeat(250)));
        let first = prepare(0, &item, &config());
        let second = prepare(0, &item, &config());

        let explanation = first.request.explanation.clone().unwrap();
        assert_eq!(explanation.chars().count(), 195);
        assert_eq!(first, second);
    }

    #[test]
    fn test_quiz_uses_default_explanation() {
        let prepared = prepare(0, &quiz("Q", None), &config());
        assert_eq!(
            prepared.request.explanation.as_deref(),
            Some("✅ The correct answer is revealed after you vote.")
        );
        assert!(prepared.follow_up.is_none());
    }

    #[test]
    fn test_regular_poll_explanation_follows() {
        let item = PollItem {
            correct_option: None,
            ..quiz("Opinion?", Some("Thanks for voting"))
        };
        let prepared = prepare(0, &item, &config());

        assert_eq!(prepared.request.correct_option, None);
        assert_eq!(prepared.request.explanation, None);
        assert_eq!(prepared.follow_up.as_deref(), Some("Thanks for voting"));
    }

    #[test]
    fn test_repair_explanation_counts_utf16() {
        let mut request = prepare(0, &quiz("Q", Some(&"😀".repeat(150))), &config()).request;
        // 150 emoji fit the 200 character limit but are 300 UTF-16 units
        assert_eq!(request.explanation.as_ref().unwrap().chars().count(), 150);

        assert!(repair(&mut request, TextField::Explanation, &config()));
        let repaired = request.explanation.clone().unwrap();
        assert!(repaired.encode_utf16().count() <= 195);

        assert!(!repair(&mut request, TextField::Explanation, &config()));
    }

    #[test]
    fn test_repair_question_cuts_to_the_full_limit() {
        let mut request = prepare(0, &quiz(&"😀".repeat(150), None), &config()).request;
        // "Q1: " plus 150 emoji is 304 UTF-16 units
        assert_eq!(request.question.encode_utf16().count(), 304);

        assert!(repair(&mut request, TextField::Question, &config()));
        assert_eq!(request.question.encode_utf16().count(), 300);
        assert!(request.question.starts_with("Q1: "));

        assert!(!repair(&mut request, TextField::Question, &config()));
    }

    #[test]
    fn test_repair_text_is_not_possible() {
        let mut request = prepare(0, &quiz("Q", None), &config()).request;
        assert!(!repair(&mut request, TextField::Text, &config()));
    }
}
