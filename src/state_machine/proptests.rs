//! Property-based tests for the turn controller
//!
//! These verify the spine invariants across arbitrary inputs: rejected
//! submissions never produce effects, and a reveal emits exactly the ordered
//! character prefixes of the final text.

use super::transition::*;
use super::*;
use crate::reveal::RevealState;
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    // Printable unicode, so prefix stepping gets multi-byte coverage.
    "\\PC{0,24}"
}

fn arb_choice() -> impl Strategy<Value = String> {
    "[A-Za-z ]{1,12}"
}

fn arb_choices() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(arb_choice(), 0..4)
}

fn arb_busy_phase() -> impl Strategy<Value = TurnPhase> {
    prop_oneof![
        Just(TurnPhase::AwaitingRemote),
        (arb_text(), arb_choices())
            .prop_map(|(text, choices)| TurnPhase::Revealing(RevealState::new(text, choices))),
    ]
}

fn arb_submission() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_text().prop_map(|text| Event::SubmitText { text }),
        arb_choice().prop_map(|choice| Event::SelectChoice { choice }),
    ]
}

fn ready_guards() -> TurnGuards {
    TurnGuards {
        session_ready: true,
        pending_choices: None,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Submissions during a busy phase are rejected with no effects, so the
    /// transcript can never be mutated outside Idle admission.
    #[test]
    fn busy_phase_rejects_all_submissions(
        phase in arb_busy_phase(),
        submission in arb_submission(),
    ) {
        let result = transition(&phase, &ready_guards(), submission);
        prop_assert!(matches!(result, Err(TransitionError::Busy)));
    }

    /// Before the session is established every submission is rejected.
    #[test]
    fn unready_session_rejects_all_submissions(submission in arb_submission()) {
        let result = transition(&TurnPhase::Idle, &TurnGuards::default(), submission);
        prop_assert!(matches!(result, Err(TransitionError::SessionNotReady)));
    }

    /// Driving a reveal to completion publishes exactly the ordered character
    /// prefixes of the final text, then commits the full text and choices.
    #[test]
    fn reveal_emits_exact_prefix_sequence(
        text in arb_text(),
        choices in arb_choices(),
    ) {
        let guards = ready_guards();
        let result = transition(
            &TurnPhase::Idle,
            &guards,
            Event::SubmitText { text: "go".to_string() },
        )
        .unwrap();
        let mut phase = result.new_phase;

        let result = transition(&phase, &guards, Event::ExchangeSucceeded {
            output: text.clone(),
            choices: choices.clone(),
        })
        .unwrap();
        phase = result.new_phase;

        let total = text.chars().count();
        let mut published = Vec::new();
        for cursor in 1..=total {
            let step = transition(&phase, &guards, Event::RevealStep { cursor }).unwrap();
            for effect in &step.effects {
                if let Effect::PublishReveal { prefix } = effect {
                    published.push(prefix.clone());
                }
            }
            phase = step.new_phase;
        }

        let expected: Vec<String> = (1..=total)
            .map(|n| crate::reveal::prefix_of(&text, n))
            .collect();
        prop_assert_eq!(&published, &expected);

        let done = transition(&phase, &guards, Event::RevealFinished).unwrap();
        prop_assert_eq!(&done.new_phase, &TurnPhase::Idle);
        prop_assert_eq!(
            &done.effects[0],
            &Effect::CommitModelTurn { text, choices }
        );
    }

    /// While gated, free text is always rejected and only offered values are
    /// admitted; an admitted choice resolves before it appends.
    #[test]
    fn gate_admits_only_offered_choices(
        offered in proptest::collection::vec(arb_choice(), 1..4),
        outsider in arb_choice(),
        text in arb_text(),
    ) {
        let guards = TurnGuards {
            session_ready: true,
            pending_choices: Some(offered.clone()),
        };

        let free = transition(&TurnPhase::Idle, &guards, Event::SubmitText { text });
        prop_assert!(matches!(
            free,
            Err(TransitionError::GateActive | TransitionError::EmptySubmission)
        ));

        let picked = offered[0].clone();
        let result = transition(&TurnPhase::Idle, &guards, Event::SelectChoice {
            choice: picked.clone(),
        })
        .unwrap();
        prop_assert_eq!(&result.effects[0], &Effect::ResolveChoice { choice: picked });

        if !offered.contains(&outsider) {
            let rejected = transition(&TurnPhase::Idle, &guards, Event::SelectChoice {
                choice: outsider,
            });
            let not_offered = matches!(rejected, Err(TransitionError::ChoiceNotOffered { .. }));
            prop_assert!(not_offered, "outsider choice was not rejected");
        }
    }

    /// Every diagnostic turn is recognizably an error and carries the
    /// server-reported detail when one exists.
    #[test]
    fn diagnostic_text_keeps_detail(detail in arb_text()) {
        let text = diagnostic_text(Some(&detail));
        prop_assert!(text.starts_with("⚠️ Error: "));
        prop_assert!(text.ends_with(&detail));
    }
}
