//! Review workflow for a single queue item.
//!
//! A [`ReviewSession`] holds the analysis as loaded from the backend and a
//! working copy the reviewer edits. Decisions are produced as plain values;
//! the caller sends them to the backend and calls [`ReviewSession::complete`]
//! once the backend accepted them.

use super::errors::{DomainError, DomainResult};
use super::models::{Analysis, AnalysisField, QueueStatus, ReviewQueueItem};

/// Highest star rating a reviewer can give.
pub const MAX_QUALITY_RATING: u8 = 5;

/// Outcome of a review, ready to be sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewDecision {
    Approve {
        queue_id: i64,
        quality_rating: Option<u8>,
    },
    UpdateAndApprove {
        queue_id: i64,
        edited_analysis: Box<Analysis>,
        edit_notes: String,
        quality_rating: Option<u8>,
    },
    Reject {
        queue_id: i64,
        rejection_reason: String,
    },
}

impl ReviewDecision {
    pub fn queue_id(&self) -> i64 {
        match self {
            ReviewDecision::Approve { queue_id, .. }
            | ReviewDecision::UpdateAndApprove { queue_id, .. }
            | ReviewDecision::Reject { queue_id, .. } => *queue_id,
        }
    }

    /// Status the queue item takes once the decision is accepted.
    pub fn resulting_status(&self) -> QueueStatus {
        match self {
            ReviewDecision::Approve { .. } | ReviewDecision::UpdateAndApprove { .. } => {
                QueueStatus::Approved
            }
            ReviewDecision::Reject { .. } => QueueStatus::Rejected,
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            ReviewDecision::Approve { .. } => "Analysis approved successfully",
            ReviewDecision::UpdateAndApprove { .. } => {
                "Analysis updated and approved successfully"
            }
            ReviewDecision::Reject { .. } => "Analysis rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSession {
    /// The queue item under review.
    pub item: ReviewQueueItem,
    /// Analysis exactly as the backend returned it.
    pub current_analysis: Analysis,
    /// Working copy; only this one is touched by edits.
    pub edited_analysis: Analysis,
    pub is_editing: bool,
    /// 0 means unrated.
    pub quality_rating: u8,
    pub edit_notes: String,
    pub rejection_reason: String,
}

impl ReviewSession {
    /// Opens `item` for review. A pending item moves to in-review.
    pub fn open(mut item: ReviewQueueItem) -> DomainResult<Self> {
        let analysis = item
            .analysis
            .clone()
            .ok_or(DomainError::NoAnalysisLoaded(item.id))?;

        if item.queue_status == QueueStatus::Pending {
            item.queue_status = QueueStatus::InReview;
        }

        Ok(Self {
            quality_rating: item.quality_rating.unwrap_or(0),
            item,
            edited_analysis: analysis.clone(),
            current_analysis: analysis,
            is_editing: false,
            edit_notes: String::new(),
            rejection_reason: String::new(),
        })
    }

    pub fn queue_id(&self) -> i64 {
        self.item.id
    }

    pub fn status(&self) -> QueueStatus {
        self.item.queue_status
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.item.queue_status.is_terminal() {
            return Err(DomainError::AlreadyFinalized(self.item.queue_status));
        }
        Ok(())
    }

    pub fn begin_edit(&mut self) -> DomainResult<()> {
        self.ensure_open()?;
        self.is_editing = true;
        Ok(())
    }

    /// Changes one field of the working copy.
    pub fn edit_field(&mut self, field: AnalysisField, value: &str) -> DomainResult<()> {
        self.ensure_open()?;
        if !self.is_editing {
            return Err(DomainError::NotEditing);
        }
        self.edited_analysis.set_field(field, value)
    }

    /// Throws away all edits and leaves edit mode.
    pub fn cancel_edits(&mut self) {
        self.edited_analysis = self.current_analysis.clone();
        self.is_editing = false;
    }

    pub fn has_pending_edits(&self) -> bool {
        self.edited_analysis != self.current_analysis
    }

    pub fn set_quality_rating(&mut self, rating: u8) -> DomainResult<()> {
        if rating > MAX_QUALITY_RATING {
            return Err(DomainError::InvalidQualityRating(rating));
        }
        self.quality_rating = rating;
        Ok(())
    }

    fn rating(&self) -> Option<u8> {
        (self.quality_rating > 0).then_some(self.quality_rating)
    }

    /// Builds the approve decision. In edit mode the working copy and notes
    /// travel with it; otherwise only the rating does.
    pub fn approve(&self) -> DomainResult<ReviewDecision> {
        self.ensure_open()?;
        if self.is_editing {
            Ok(ReviewDecision::UpdateAndApprove {
                queue_id: self.queue_id(),
                edited_analysis: Box::new(self.edited_analysis.clone()),
                edit_notes: self.edit_notes.clone(),
                quality_rating: self.rating(),
            })
        } else {
            Ok(ReviewDecision::Approve {
                queue_id: self.queue_id(),
                quality_rating: self.rating(),
            })
        }
    }

    /// Builds the reject decision. The reason must not be blank.
    pub fn reject(&self) -> DomainResult<ReviewDecision> {
        self.ensure_open()?;
        let reason = self.rejection_reason.trim();
        if reason.is_empty() {
            return Err(DomainError::MissingRejectionReason);
        }
        Ok(ReviewDecision::Reject {
            queue_id: self.queue_id(),
            rejection_reason: reason.to_string(),
        })
    }

    /// Records a decision the backend has accepted.
    pub fn complete(&mut self, decision: &ReviewDecision) -> DomainResult<()> {
        self.ensure_open()?;
        match decision {
            ReviewDecision::Approve { quality_rating, .. } => {
                self.item.quality_rating = *quality_rating;
            }
            ReviewDecision::UpdateAndApprove {
                edited_analysis,
                edit_notes,
                quality_rating,
                ..
            } => {
                self.current_analysis = (**edited_analysis).clone();
                self.edited_analysis = (**edited_analysis).clone();
                self.item.analysis = Some((**edited_analysis).clone());
                self.item.was_edited = true;
                self.item.edit_notes = Some(edit_notes.clone());
                self.item.quality_rating = *quality_rating;
                self.is_editing = false;
            }
            ReviewDecision::Reject {
                rejection_reason, ..
            } => {
                self.item.rejection_reason = Some(rejection_reason.clone());
            }
        }
        self.item.queue_status = decision.resulting_status();
        Ok(())
    }
}
