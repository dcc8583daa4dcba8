//! Ballots of a vote and their structural rules.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use votebasis_core::{BallotId, DomainError, DomainResult, Entity, Translations};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotType {
    /// One question.
    StandardBallot,
    /// A main question with variants, optionally resolved by tie-break questions.
    VariantsBallot,
}

/// Role of a ballot when variants are spread over several ballots.
///
/// The declaration order is the order ballots must appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotSubType {
    Unspecified,
    Main,
    CounterProposal1,
    CounterProposal2,
    CounterProposal3,
    Variant1,
    Variant2,
    Variant3,
    TieBreak1,
    TieBreak2,
    TieBreak3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotQuestionType {
    MainBallot,
    CounterProposal,
    Variant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotQuestion {
    pub number: u32,
    pub question: Translations,
    pub question_type: BallotQuestionType,
}

/// Asks which of two accepted questions is preferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieBreakQuestion {
    pub number: u32,
    pub question: Translations,
    pub question1_number: u32,
    pub question2_number: u32,
}

/// Nested entity: Ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub id: BallotId,
    pub position: u32,
    pub ballot_type: BallotType,
    pub sub_type: BallotSubType,
    pub description: Translations,
    pub has_tie_break_questions: bool,
    pub questions: Vec<BallotQuestion>,
    pub tie_break_questions: Vec<TieBreakQuestion>,
}

impl Entity for Ballot {
    type Id = BallotId;

    fn id(&self) -> &BallotId {
        &self.id
    }
}

/// Caller-supplied ballot fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotInput {
    pub position: u32,
    pub ballot_type: BallotType,
    pub sub_type: BallotSubType,
    pub description: Translations,
    pub has_tie_break_questions: bool,
    pub questions: Vec<BallotQuestion>,
    pub tie_break_questions: Vec<TieBreakQuestion>,
}

impl BallotInput {
    pub fn into_ballot(self, id: BallotId) -> Ballot {
        Ballot {
            id,
            position: self.position,
            ballot_type: self.ballot_type,
            sub_type: self.sub_type,
            description: self.description,
            has_tie_break_questions: self.has_tie_break_questions,
            questions: self.questions,
            tie_break_questions: self.tie_break_questions,
        }
    }
}

impl Ballot {
    /// Validate questions and tie-break questions of a single ballot.
    pub fn validate_questions(&self) -> DomainResult<()> {
        if self.questions.iter().any(|q| q.question.is_empty()) {
            return Err(DomainError::validation("ballot questions need a text"));
        }

        let numbers: Vec<u32> = self.questions.iter().map(|q| q.number).collect();
        let expected: Vec<u32> = (1..=self.questions.len() as u32).collect();
        if numbers != expected {
            return Err(DomainError::validation(
                "ballot questions must be numbered continuously from 1",
            ));
        }

        match self.ballot_type {
            BallotType::StandardBallot => {
                if self.questions.len() != 1 {
                    return Err(DomainError::validation(
                        "a standard ballot has exactly one question",
                    ));
                }
                if self.has_tie_break_questions || !self.tie_break_questions.is_empty() {
                    return Err(DomainError::validation(
                        "a standard ballot cannot have tie-break questions",
                    ));
                }
            }
            BallotType::VariantsBallot => {
                if self.questions.len() < 2 {
                    return Err(DomainError::validation(
                        "a variants ballot has at least two questions",
                    ));
                }
                if !self.has_tie_break_questions && !self.tie_break_questions.is_empty() {
                    return Err(DomainError::validation(
                        "tie-break questions are not enabled on this ballot",
                    ));
                }
                self.validate_tie_break_questions()?;
            }
        }
        Ok(())
    }

    fn validate_tie_break_questions(&self) -> DomainResult<()> {
        let question_count = self.questions.len() as u32;
        let mut pairs = BTreeSet::new();

        for (index, tie_break) in self.tie_break_questions.iter().enumerate() {
            if tie_break.number != index as u32 + 1 {
                return Err(DomainError::validation(
                    "tie-break questions must be numbered continuously from 1",
                ));
            }
            let (a, b) = (tie_break.question1_number, tie_break.question2_number);
            if a == b {
                return Err(DomainError::validation(format!(
                    "tie-break question {} compares question {a} with itself",
                    tie_break.number
                )));
            }
            if !(1..=question_count).contains(&a) || !(1..=question_count).contains(&b) {
                return Err(DomainError::not_found(format!(
                    "question referenced by tie-break question {}",
                    tie_break.number
                )));
            }
            if !pairs.insert((a.min(b), a.max(b))) {
                return Err(DomainError::validation(format!(
                    "questions {a} and {b} already have a tie-break question"
                )));
            }
        }
        Ok(())
    }

    /// Question and tie-break texts only, for late updates.
    pub fn with_texts_of(&self, other: &BallotInput) -> Ballot {
        let mut updated = self.clone();
        updated.description = other.description.clone();
        for (question, text) in updated.questions.iter_mut().zip(&other.questions) {
            question.question = text.question.clone();
        }
        for (tie_break, text) in updated
            .tie_break_questions
            .iter_mut()
            .zip(&other.tie_break_questions)
        {
            tie_break.question = text.question.clone();
        }
        updated
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn question(number: u32) -> BallotQuestion {
        BallotQuestion {
            number,
            question: Translations::new().with("de", format!("Frage {number}")),
            question_type: if number == 1 {
                BallotQuestionType::MainBallot
            } else {
                BallotQuestionType::CounterProposal
            },
        }
    }

    pub fn standard(position: u32) -> BallotInput {
        BallotInput {
            position,
            ballot_type: BallotType::StandardBallot,
            sub_type: BallotSubType::Unspecified,
            description: Translations::new().with("de", "Vorlage"),
            has_tie_break_questions: false,
            questions: vec![question(1)],
            tie_break_questions: Vec::new(),
        }
    }

    pub fn variants(position: u32) -> BallotInput {
        BallotInput {
            position,
            ballot_type: BallotType::VariantsBallot,
            sub_type: BallotSubType::Unspecified,
            description: Translations::new().with("de", "Initiative und Gegenvorschlag"),
            has_tie_break_questions: true,
            questions: vec![question(1), question(2)],
            tie_break_questions: vec![TieBreakQuestion {
                number: 1,
                question: Translations::new().with("de", "Stichfrage"),
                question1_number: 1,
                question2_number: 2,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn ballot(input: BallotInput) -> Ballot {
        input.into_ballot(BallotId::new())
    }

    #[test]
    fn standard_ballot_has_one_question_and_no_tie_breaks() {
        assert!(ballot(standard(1)).validate_questions().is_ok());

        let mut two = standard(1);
        two.questions.push(question(2));
        assert!(ballot(two).validate_questions().is_err());

        let mut tie_break = standard(1);
        tie_break.has_tie_break_questions = true;
        assert!(ballot(tie_break).validate_questions().is_err());
    }

    #[test]
    fn variants_ballot_needs_two_numbered_questions() {
        assert!(ballot(variants(1)).validate_questions().is_ok());

        let mut one = variants(1);
        one.questions.truncate(1);
        one.tie_break_questions.clear();
        assert!(ballot(one).validate_questions().is_err());

        let mut gap = variants(1);
        gap.questions[1].number = 3;
        assert!(ballot(gap).validate_questions().is_err());
    }

    #[test]
    fn tie_breaks_reference_distinct_existing_questions() {
        let mut same = variants(1);
        same.tie_break_questions[0].question2_number = 1;
        assert!(matches!(
            ballot(same).validate_questions(),
            Err(DomainError::Validation(_))
        ));

        let mut unknown = variants(1);
        unknown.tie_break_questions[0].question2_number = 3;
        assert!(matches!(
            ballot(unknown).validate_questions(),
            Err(DomainError::NotFound(_))
        ));

        let mut disabled = variants(1);
        disabled.has_tie_break_questions = false;
        assert!(ballot(disabled).validate_questions().is_err());
    }

    #[test]
    fn text_update_keeps_structure() {
        let current = ballot(variants(1));
        let mut texts = variants(1);
        texts.questions[0].question = Translations::new().with("de", "Neu");
        texts.tie_break_questions[0].question2_number = 1;

        let updated = current.with_texts_of(&texts);
        assert_eq!(updated.questions[0].question.get("de"), Some("Neu"));
        assert_eq!(updated.tie_break_questions[0].question2_number, 2);
    }
}
