use crate::error::BookingError;
use crate::models::{
    AttemptStatus, BookingQuery, PaymentAttempt, Quote, RoomOffer, TransactionStatus,
};

/// Submitted query and the offers derived for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub query: BookingQuery,
    pub offers: Vec<RoomOffer>,
}

/// The chosen offer with its local-currency quote, fixed at selection time.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedRoom {
    pub offer: RoomOffer,
    pub quote: Quote,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    AwaitingQuery,
    RoomsListed(Session),
    PaymentPending {
        session: Session,
        selected: SelectedRoom,
    },
    /// A charge was accepted; the reference is waiting to be verified.
    AwaitingVerification {
        session: Session,
        selected: SelectedRoom,
        attempt: PaymentAttempt,
    },
    PaymentVerifying {
        session: Session,
        selected: SelectedRoom,
        attempt: PaymentAttempt,
    },
    /// Verified; the wizard closes once the close delay elapses.
    Paid { attempt: PaymentAttempt },
    /// Card flow handed off to the gateway's hosted page.
    Redirected {
        authorization_url: String,
        reference: String,
    },
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RoomsFound(Session),
    /// A query came back without any bookable room.
    NoRooms,
    RoomSelected(SelectedRoom),
    Back,
    ChargeAccepted(PaymentAttempt),
    CheckoutCreated {
        authorization_url: String,
        reference: String,
    },
    VerificationStarted,
    VerificationFinished(TransactionStatus),
    /// The verify call itself failed.
    VerificationAborted,
    CloseDelayElapsed,
    Close,
    Open,
}

impl Event {
    pub fn operation(&self) -> &'static str {
        match self {
            Event::RoomsFound(_) | Event::NoRooms => "submit a query",
            Event::RoomSelected(_) => "select a room",
            Event::Back => "go back",
            Event::ChargeAccepted(_) | Event::CheckoutCreated { .. } => "submit a payment",
            Event::VerificationStarted
            | Event::VerificationFinished(_)
            | Event::VerificationAborted => "verify a payment",
            Event::CloseDelayElapsed | Event::Close => "close",
            Event::Open => "open",
        }
    }
}

impl WizardState {
    pub fn name(&self) -> &'static str {
        match self {
            WizardState::AwaitingQuery => "awaiting a query",
            WizardState::RoomsListed(_) => "listing rooms",
            WizardState::PaymentPending { .. } => "awaiting payment",
            WizardState::AwaitingVerification { .. } => "awaiting verification",
            WizardState::PaymentVerifying { .. } => "verifying payment",
            WizardState::Paid { .. } => "paid",
            WizardState::Redirected { .. } => "redirected",
            WizardState::Closed => "closed",
        }
    }

    pub fn offers(&self) -> &[RoomOffer] {
        match self {
            WizardState::RoomsListed(session)
            | WizardState::PaymentPending { session, .. }
            | WizardState::AwaitingVerification { session, .. }
            | WizardState::PaymentVerifying { session, .. } => &session.offers,
            _ => &[],
        }
    }

    pub fn selected(&self) -> Option<&SelectedRoom> {
        match self {
            WizardState::PaymentPending { selected, .. }
            | WizardState::AwaitingVerification { selected, .. }
            | WizardState::PaymentVerifying { selected, .. } => Some(selected),
            _ => None,
        }
    }

    /// Gateway reference, present only once a charge was accepted.
    pub fn reference(&self) -> Option<&str> {
        match self {
            WizardState::AwaitingVerification { attempt, .. }
            | WizardState::PaymentVerifying { attempt, .. }
            | WizardState::Paid { attempt } => Some(&attempt.reference),
            WizardState::Redirected { reference, .. } => Some(reference),
            _ => None,
        }
    }

    /// Consume the state and `event`. A rejected event hands the state back
    /// untouched alongside the error.
    pub fn apply(self, event: Event) -> Result<WizardState, (WizardState, BookingError)> {
        use WizardState::*;

        match (self, event) {
            (AwaitingQuery | RoomsListed(_), Event::RoomsFound(session)) => Ok(RoomsListed(session)),
            (AwaitingQuery | RoomsListed(_), Event::NoRooms) => Ok(AwaitingQuery),
            (RoomsListed(session), Event::RoomSelected(selected)) => {
                Ok(PaymentPending { session, selected })
            }
            (RoomsListed(_), Event::Back) => Ok(AwaitingQuery),
            (PaymentPending { session, .. }, Event::Back) => Ok(RoomsListed(session)),
            (PaymentPending { session, selected }, Event::ChargeAccepted(attempt)) => {
                Ok(AwaitingVerification {
                    session,
                    selected,
                    attempt,
                })
            }
            (
                PaymentPending { .. },
                Event::CheckoutCreated {
                    authorization_url,
                    reference,
                },
            ) => Ok(Redirected {
                authorization_url,
                reference,
            }),
            (
                AwaitingVerification {
                    session,
                    selected,
                    attempt,
                }
                | PaymentVerifying {
                    session,
                    selected,
                    attempt,
                },
                Event::VerificationStarted,
            ) => Ok(PaymentVerifying {
                session,
                selected,
                attempt,
            }),
            (
                PaymentVerifying {
                    session,
                    selected,
                    mut attempt,
                },
                Event::VerificationFinished(status),
            ) => match status {
                TransactionStatus::Success => {
                    attempt.status = AttemptStatus::Success;
                    Ok(Paid { attempt })
                }
                TransactionStatus::Failed => Ok(PaymentPending { session, selected }),
                TransactionStatus::Pending(_) => Ok(AwaitingVerification {
                    session,
                    selected,
                    attempt,
                }),
            },
            (
                PaymentVerifying {
                    session,
                    selected,
                    attempt,
                },
                Event::VerificationAborted,
            ) => Ok(AwaitingVerification {
                session,
                selected,
                attempt,
            }),
            (Paid { .. }, Event::CloseDelayElapsed) => Ok(Closed),
            (_, Event::Close) => Ok(Closed),
            (Closed | Redirected { .. }, Event::Open) => Ok(AwaitingQuery),
            (state, event) => {
                let error = BookingError::InvalidTransition {
                    operation: event.operation(),
                    state: state.name(),
                };
                Err((state, error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MinorUnits, PaymentMethod};
    use chrono::NaiveDate;

    fn session() -> Session {
        let day = |d| NaiveDate::from_ymd_opt(2025, 4, d).unwrap();
        Session {
            query: BookingQuery::new(day(1), day(3), 1107218, day(1)).unwrap(),
            offers: vec![RoomOffer {
                id: 2634263,
                display_name: "Room 1".to_string(),
                nightly_price_usd: 35.0,
                currency_symbol: "$".to_string(),
                available: true,
                image: None,
                detail: None,
            }],
        }
    }

    fn selected() -> SelectedRoom {
        SelectedRoom {
            offer: session().offers[0].clone(),
            quote: Quote::new(35.0, 14.3).unwrap(),
        }
    }

    fn attempt() -> PaymentAttempt {
        PaymentAttempt {
            email: "guest@example.com".to_string(),
            method: PaymentMethod::Card,
            amount: MinorUnits(50050),
            reference: "r1".to_string(),
            status: AttemptStatus::Pending,
        }
    }

    fn verifying() -> WizardState {
        WizardState::PaymentVerifying {
            session: session(),
            selected: selected(),
            attempt: attempt(),
        }
    }

    #[test]
    fn rejected_event_returns_state_unchanged() {
        let (state, err) = WizardState::AwaitingQuery
            .apply(Event::RoomSelected(selected()))
            .unwrap_err();
        assert_eq!(state, WizardState::AwaitingQuery);
        assert!(matches!(
            err,
            BookingError::InvalidTransition {
                operation: "select a room",
                state: "awaiting a query"
            }
        ));
    }

    #[test]
    fn failed_verification_clears_reference() {
        let next = verifying()
            .apply(Event::VerificationFinished(TransactionStatus::Failed))
            .unwrap();
        assert!(matches!(next, WizardState::PaymentPending { .. }));
        assert_eq!(next.reference(), None);
    }

    #[test]
    fn pending_verification_keeps_reference() {
        let next = verifying()
            .apply(Event::VerificationFinished(TransactionStatus::Pending("ongoing".into())))
            .unwrap();
        assert!(matches!(next, WizardState::AwaitingVerification { .. }));
        assert_eq!(next.reference(), Some("r1"));
    }

    #[test]
    fn abandoned_verification_can_be_restarted() {
        let next = verifying().apply(Event::VerificationStarted).unwrap();
        assert!(matches!(next, WizardState::PaymentVerifying { .. }));
    }

    #[test]
    fn back_walks_towards_the_query() {
        let state = WizardState::PaymentPending {
            session: session(),
            selected: selected(),
        };
        let state = state.apply(Event::Back).unwrap();
        assert!(matches!(state, WizardState::RoomsListed(_)));
        let state = state.apply(Event::Back).unwrap();
        assert_eq!(state, WizardState::AwaitingQuery);
        assert!(state.apply(Event::Back).is_err());
    }

    #[test]
    fn empty_result_discards_listed_rooms() {
        let state = WizardState::RoomsListed(session())
            .apply(Event::NoRooms)
            .unwrap();
        assert_eq!(state, WizardState::AwaitingQuery);
        assert!(state.offers().is_empty());

        let paying = WizardState::PaymentPending {
            session: session(),
            selected: selected(),
        };
        let (state, _) = paying.apply(Event::NoRooms).unwrap_err();
        assert!(matches!(state, WizardState::PaymentPending { .. }));
    }

    #[test]
    fn close_is_always_accepted() {
        for state in [WizardState::AwaitingQuery, verifying(), WizardState::Closed] {
            assert_eq!(state.apply(Event::Close).unwrap(), WizardState::Closed);
        }
    }
}
