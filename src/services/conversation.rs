use rusqlite::Connection;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{Appointment, ConversationState, Intent, IntentSignal, Session, Slot};
use crate::services::ai::{LlmProvider, Message};
use crate::services::extraction::extract_fields;
use crate::services::matcher::find_matching_doctor;
use crate::services::scheduling::{ensure_slot_open, BookingContext, ValidationMode};

#[derive(Debug)]
pub struct TurnReport {
    pub reply: String,
    pub outcome: TurnOutcome,
}

#[derive(Debug)]
pub enum TurnOutcome {
    /// Still gathering fields or waiting for an intent.
    Collecting,
    /// The user asked to book and to cancel in the same message.
    AmbiguousIntent,
    Booked(Appointment),
    Cancelled(Appointment),
    /// Cancel ran but no appointment matched the fields.
    NothingToCancel(Appointment),
    /// Recoverable validation failure; the session keeps going.
    Rejected(AppError),
    /// The requested slot is not open. `open` lists what the doctor still has.
    SlotRejected { error: AppError, open: Vec<Slot> },
}

impl TurnOutcome {
    /// Status line shown after the assistant reply, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            TurnOutcome::Collecting => None,
            TurnOutcome::AmbiguousIntent => Some(
                "Please tell me whether you want to book or cancel, one at a time.".to_string(),
            ),
            TurnOutcome::Booked(appt) => Some(format!("Appointment booked for {appt}.")),
            TurnOutcome::Cancelled(appt) => Some(format!("Appointment canceled for {appt}.")),
            TurnOutcome::NothingToCancel(appt) => Some(format!(
                "No appointment found for {appt}; nothing was canceled."
            )),
            TurnOutcome::Rejected(err) => Some(err.to_string()),
            TurnOutcome::SlotRejected { error, open } if open.is_empty() => {
                Some(format!("{error} No open slots remain for this doctor."))
            }
            TurnOutcome::SlotRejected { error, open } => {
                let slots: Vec<String> = open.iter().map(Slot::to_string).collect();
                Some(format!("{error} Available slots: {}.", slots.join(", ")))
            }
        }
    }
}

/// Run one user turn: record the message, ask the model, then act on its reply.
pub async fn process_message(
    llm: &dyn LlmProvider,
    conn: &mut Connection,
    ctx: &mut BookingContext,
    session: &mut Session,
    input: &str,
) -> AppResult<TurnReport> {
    session.push("user", input);

    let messages: Vec<Message> = session
        .messages
        .iter()
        .map(|m| Message {
            role: m.role.clone(),
            content: m.content.clone(),
        })
        .collect();

    let reply = llm
        .chat(&session.system_prompt, &messages)
        .await
        .map_err(|e| AppError::ModelService(format!("{e:#}")))?;

    session.push("assistant", &reply);

    let outcome = apply_reply(conn, ctx, session, input, &reply)?;
    Ok(TurnReport { reply, outcome })
}

/// Apply one model reply to the session. No model call happens here, so the
/// transition can be driven with canned replies.
pub fn apply_reply(
    conn: &mut Connection,
    ctx: &mut BookingContext,
    session: &mut Session,
    input: &str,
    reply: &str,
) -> AppResult<TurnOutcome> {
    match ctx.mode {
        ValidationMode::ClientSide => apply_client_side(conn, ctx, session, input, reply),
        ValidationMode::ModelAssisted => apply_model_assisted(conn, ctx, session, reply),
    }
}

fn apply_client_side(
    conn: &mut Connection,
    ctx: &BookingContext,
    session: &mut Session,
    input: &str,
    reply: &str,
) -> AppResult<TurnOutcome> {
    let signal = Intent::detect(input);
    if let IntentSignal::Explicit(intent) = signal {
        session.intent = Some(intent);
    }

    let extracted = extract_fields(reply, ctx.today);
    session.fields.fill_missing(&extracted);

    tracing::info!(
        intent = ?session.intent,
        state = session.state.as_str(),
        complete = session.fields.is_complete(),
        "processing reply"
    );

    if signal == IntentSignal::Ambiguous {
        return Ok(TurnOutcome::AmbiguousIntent);
    }
    let Some(intent) = session.intent else {
        return Ok(TurnOutcome::Collecting);
    };
    let Some(requested) = session.fields.to_appointment() else {
        return Ok(TurnOutcome::Collecting);
    };

    session.state = ConversationState::Acting;

    let Some(doctor) = find_matching_doctor(&requested.doctor, &ctx.roster).map(str::to_string)
    else {
        tracing::warn!(doctor = %requested.doctor, "doctor not in roster");
        session.fields.doctor = None;
        session.state = ConversationState::Collecting;
        return Ok(TurnOutcome::Rejected(AppError::UnknownDoctor(requested.doctor)));
    };
    session.fields.doctor = Some(doctor.clone());
    let appt = Appointment { doctor, ..requested };

    match intent {
        Intent::Book => {
            let open = queries::list_open_slots(conn, &appt.doctor)?;
            tracing::info!(doctor = %appt.doctor, open = ?open, "available slots");

            let booked =
                ensure_slot_open(&open, &appt).and_then(|()| queries::book_appointment(conn, &appt));
            match booked {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    tracing::info!(error = %e, "slot rejected");
                    session.fields.date = None;
                    session.fields.time = None;
                    session.state = ConversationState::Collecting;
                    // a lost race means the listing above is already stale
                    let open = queries::list_open_slots(conn, &appt.doctor)?;
                    return Ok(TurnOutcome::SlotRejected { error: e, open });
                }
                Err(e) => return Err(e),
            }

            tracing::info!(patient = %appt.patient, doctor = %appt.doctor, "appointment booked");
            session.reset();
            Ok(TurnOutcome::Booked(appt))
        }
        Intent::Cancel => {
            let removed = queries::cancel_appointment(conn, &appt)?;
            tracing::info!(patient = %appt.patient, doctor = %appt.doctor, removed, "cancel processed");
            session.reset();
            if removed {
                Ok(TurnOutcome::Cancelled(appt))
            } else {
                Ok(TurnOutcome::NothingToCancel(appt))
            }
        }
    }
}

/// Each reply stands alone: a complete one is checked against the published
/// allow-list and slot table, then booked.
fn apply_model_assisted(
    conn: &mut Connection,
    ctx: &mut BookingContext,
    session: &mut Session,
    reply: &str,
) -> AppResult<TurnOutcome> {
    let Some(requested) = extract_fields(reply, ctx.today).to_appointment() else {
        return Ok(TurnOutcome::Collecting);
    };

    let allow_list = ctx.allow_list();
    let Some(doctor) = find_matching_doctor(&requested.doctor, &allow_list).map(str::to_string)
    else {
        tracing::warn!(doctor = %requested.doctor, "doctor not in allow-list");
        return Ok(TurnOutcome::Rejected(AppError::UnknownDoctor(requested.doctor)));
    };
    let appt = Appointment { doctor, ..requested };

    let published = ctx
        .availability
        .get(&appt.doctor)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let booked =
        ensure_slot_open(published, &appt).and_then(|()| queries::book_appointment(conn, &appt));
    match booked {
        Ok(()) => {}
        Err(e) if e.is_recoverable() => {
            tracing::info!(error = %e, "slot rejected");
            ctx.refresh_availability(conn)?;
            session.system_prompt = ctx.system_prompt();
            let open = ctx.availability.get(&appt.doctor).cloned().unwrap_or_default();
            return Ok(TurnOutcome::SlotRejected { error: e, open });
        }
        Err(e) => return Err(e),
    }

    tracing::info!(patient = %appt.patient, doctor = %appt.doctor, "appointment booked");

    ctx.refresh_availability(conn)?;
    session.reset();
    session.system_prompt = ctx.system_prompt();

    Ok(TurnOutcome::Booked(appt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::NaiveDate;

    const SMITH_0900: &str = "Patient: Alice\nDoctor: Dr. Smith\nDate: 2024-06-01\nTime: 09:00:00";

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        conn.execute_batch(
            "INSERT INTO doctors (name) VALUES ('Smith');
             INSERT INTO availability (doctor_id, available_date, available_time, is_booked)
             VALUES (1, '2024-06-01', '09:00:00', 0);",
        )
        .unwrap();
        conn
    }

    fn setup(mode: ValidationMode) -> (Connection, BookingContext, Session) {
        let conn = setup_db();
        let today = NaiveDate::from_ymd_opt(2024, 5, 29).unwrap();
        let ctx = BookingContext::load(&conn, mode, today).unwrap();
        let session = Session::new(ctx.system_prompt());
        (conn, ctx, session)
    }

    fn slot_booked(conn: &Connection) -> Option<bool> {
        let slot = Slot::parse("2024-06-01", "09:00:00").unwrap();
        queries::slot_status(conn, "Smith", &slot).unwrap()
    }

    #[test]
    fn test_book_in_one_turn() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ClientSide);

        let outcome = apply_reply(
            &mut conn,
            &mut ctx,
            &mut session,
            "Book Alice with Dr. Smith on June 1st at 9am",
            SMITH_0900,
        )
        .unwrap();

        assert!(matches!(outcome, TurnOutcome::Booked(ref a) if a.doctor == "Smith"));
        assert_eq!(slot_booked(&conn), Some(true));
        assert_eq!(queries::find_appointments(&conn, "Alice").unwrap().len(), 1);
        assert!(session.fields.is_empty());
        assert!(session.intent.is_none());
    }

    #[test]
    fn test_fields_accumulate_first_value_wins() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ClientSide);

        let first = apply_reply(
            &mut conn,
            &mut ctx,
            &mut session,
            "I want to book, I'm Alice",
            "Patient: Alice\nDoctor: not provided\nDate: not provided\nTime: not provided",
        )
        .unwrap();
        assert!(matches!(first, TurnOutcome::Collecting));
        assert_eq!(session.intent, Some(Intent::Book));

        let second = apply_reply(
            &mut conn,
            &mut ctx,
            &mut session,
            "Dr. Smith, June 1 at 9",
            "Patient: Alicia\nDoctor: Dr. Smith\nDate: 2024-06-01\nTime: 09:00:00",
        )
        .unwrap();

        match second {
            TurnOutcome::Booked(appt) => assert_eq!(appt.patient, "Alice"),
            other => panic!("expected booking, got {other:?}"),
        }
    }

    #[test]
    fn test_complete_fields_without_intent_wait() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ClientSide);

        let outcome =
            apply_reply(&mut conn, &mut ctx, &mut session, "hi there", SMITH_0900).unwrap();

        assert!(matches!(outcome, TurnOutcome::Collecting));
        assert!(session.fields.is_complete());
        assert_eq!(slot_booked(&conn), Some(false));
    }

    #[test]
    fn test_unknown_doctor_clears_only_doctor() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ClientSide);

        let outcome = apply_reply(
            &mut conn,
            &mut ctx,
            &mut session,
            "book with Dr. Who",
            "Patient: Alice\nDoctor: Dr. Who\nDate: 2024-06-01\nTime: 09:00:00",
        )
        .unwrap();

        assert!(matches!(outcome, TurnOutcome::Rejected(AppError::UnknownDoctor(ref d)) if d == "Dr. Who"));
        assert!(session.fields.doctor.is_none());
        assert_eq!(session.fields.patient.as_deref(), Some("Alice"));
        assert!(session.fields.date.is_some());
        assert_eq!(session.intent, Some(Intent::Book));
        assert_eq!(session.state, ConversationState::Collecting);
    }

    #[test]
    fn test_unavailable_slot_clears_date_and_time() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ClientSide);

        let outcome = apply_reply(
            &mut conn,
            &mut ctx,
            &mut session,
            "book at 10",
            "Patient: Alice\nDoctor: Smith\nDate: 2024-06-01\nTime: 10:00:00",
        )
        .unwrap();

        assert!(matches!(
            outcome,
            TurnOutcome::SlotRejected { error: AppError::SlotUnavailable { .. }, .. }
        ));
        assert!(session.fields.date.is_none());
        assert!(session.fields.time.is_none());
        assert_eq!(session.fields.doctor.as_deref(), Some("Smith"));
        assert!(queries::find_appointments(&conn, "Alice").unwrap().is_empty());
        assert_eq!(slot_booked(&conn), Some(false));
    }

    #[test]
    fn test_unavailable_slot_lists_open_slots() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ClientSide);

        let outcome = apply_reply(
            &mut conn,
            &mut ctx,
            &mut session,
            "book at 10",
            "Patient: Alice\nDoctor: Smith\nDate: 2024-06-01\nTime: 10:00:00",
        )
        .unwrap();

        match &outcome {
            TurnOutcome::SlotRejected { open, .. } => {
                assert_eq!(open, &vec![Slot::parse("2024-06-01", "09:00:00").unwrap()]);
            }
            other => panic!("expected slot rejection, got {other:?}"),
        }
        assert_eq!(
            outcome.message().as_deref(),
            Some("No available slot for Smith on 2024-06-01 at 10:00:00. Available slots: 2024-06-01 at 09:00:00.")
        );
    }

    #[test]
    fn test_short_stored_time_is_bookable() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ClientSide);
        conn.execute(
            "UPDATE availability SET available_time = '09:00' WHERE doctor_id = 1",
            [],
        )
        .unwrap();

        let outcome = apply_reply(&mut conn, &mut ctx, &mut session, "book", SMITH_0900).unwrap();

        assert!(matches!(outcome, TurnOutcome::Booked(_)), "got {outcome:?}");
        assert_eq!(slot_booked(&conn), Some(true));
        assert!(queries::list_open_slots(&conn, "Smith").unwrap().is_empty());
    }

    #[test]
    fn test_ambiguous_turn_does_not_act() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ClientSide);

        let outcome = apply_reply(
            &mut conn,
            &mut ctx,
            &mut session,
            "cancel or book, not sure",
            SMITH_0900,
        )
        .unwrap();

        assert!(matches!(outcome, TurnOutcome::AmbiguousIntent));
        assert!(session.intent.is_none());
        assert_eq!(slot_booked(&conn), Some(false));
    }

    #[test]
    fn test_latest_explicit_intent_wins() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ClientSide);

        apply_reply(&mut conn, &mut ctx, &mut session, "book please", "How can I help?").unwrap();
        assert_eq!(session.intent, Some(Intent::Book));

        let outcome =
            apply_reply(&mut conn, &mut ctx, &mut session, "actually cancel it", SMITH_0900)
                .unwrap();

        assert!(matches!(outcome, TurnOutcome::NothingToCancel(_)));
    }

    #[test]
    fn test_cancel_after_book() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ClientSide);
        apply_reply(&mut conn, &mut ctx, &mut session, "book", SMITH_0900).unwrap();
        assert_eq!(slot_booked(&conn), Some(true));

        let outcome = apply_reply(&mut conn, &mut ctx, &mut session, "cancel", SMITH_0900).unwrap();

        assert!(matches!(outcome, TurnOutcome::Cancelled(_)));
        assert_eq!(slot_booked(&conn), Some(false));
        assert!(queries::find_appointments(&conn, "Alice").unwrap().is_empty());
    }

    #[test]
    fn test_model_assisted_books_without_keyword() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ModelAssisted);

        let outcome =
            apply_reply(&mut conn, &mut ctx, &mut session, "yes that works", SMITH_0900).unwrap();

        assert!(matches!(outcome, TurnOutcome::Booked(_)));
        assert_eq!(slot_booked(&conn), Some(true));
        assert!(ctx.availability.is_empty());
        assert!(session.system_prompt.contains("(no open slots)"));
    }

    #[test]
    fn test_model_assisted_rejects_unpublished_slot() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ModelAssisted);

        let outcome = apply_reply(
            &mut conn,
            &mut ctx,
            &mut session,
            "book",
            "Patient: Alice\nDoctor: Dr. Smith\nDate: 2024-06-01\nTime: 10:00:00",
        )
        .unwrap();

        assert!(matches!(
            outcome,
            TurnOutcome::SlotRejected { error: AppError::SlotUnavailable { .. }, .. }
        ));
        assert!(queries::find_appointments(&conn, "Alice").unwrap().is_empty());
    }

    #[test]
    fn test_model_assisted_refreshes_table_after_lost_slot() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ModelAssisted);
        assert!(session.system_prompt.contains("Dr. Smith: 2024-06-01 at 09:00:00"));

        // taken elsewhere after the table was published
        conn.execute("UPDATE availability SET is_booked = 1", []).unwrap();

        let outcome = apply_reply(&mut conn, &mut ctx, &mut session, "book", SMITH_0900).unwrap();

        assert!(matches!(
            outcome,
            TurnOutcome::SlotRejected { ref open, .. } if open.is_empty()
        ));
        assert!(ctx.availability.is_empty());
        assert!(session.system_prompt.contains("(no open slots)"));
        assert!(queries::find_appointments(&conn, "Alice").unwrap().is_empty());
    }

    #[test]
    fn test_model_assisted_rejects_unknown_doctor_without_accumulating() {
        let (mut conn, mut ctx, mut session) = setup(ValidationMode::ModelAssisted);

        let outcome = apply_reply(
            &mut conn,
            &mut ctx,
            &mut session,
            "book",
            "Patient: Alice\nDoctor: Dr. Jones\nDate: 2024-06-01\nTime: 09:00:00",
        )
        .unwrap();

        assert!(matches!(outcome, TurnOutcome::Rejected(AppError::UnknownDoctor(_))));
        assert!(session.fields.is_empty());
    }

    #[test]
    fn test_outcome_messages() {
        assert!(TurnOutcome::Collecting.message().is_none());
        let err = TurnOutcome::Rejected(AppError::UnknownDoctor("Dr. Who".to_string()));
        assert_eq!(
            err.message().as_deref(),
            Some("Doctor 'Dr. Who' not found. Please try again with a valid name.")
        );
    }
}
