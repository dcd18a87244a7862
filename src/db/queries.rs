use rusqlite::{params, Connection};

use crate::errors::{AppError, AppResult};
use crate::models::{Appointment, Doctor, Slot};

// ── Doctors ──

pub fn list_doctors(conn: &Connection) -> AppResult<Vec<Doctor>> {
    let mut stmt = conn.prepare("SELECT id, name FROM doctors ORDER BY id ASC")?;

    let rows = stmt.query_map([], |row| {
        Ok(Doctor {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;

    let mut doctors = vec![];
    for row in rows {
        doctors.push(row?);
    }
    Ok(doctors)
}

// ── Availability ──

pub fn list_open_slots(conn: &Connection, doctor: &str) -> AppResult<Vec<Slot>> {
    let mut stmt = conn.prepare(
        "SELECT a.available_date, a.available_time
         FROM availability a
         JOIN doctors d ON a.doctor_id = d.id
         WHERE d.name = ?1 AND a.is_booked = 0
         ORDER BY date(a.available_date) ASC, time(a.available_time) ASC",
    )?;

    let rows = stmt.query_map(params![doctor], |row| {
        let date: String = row.get(0)?;
        let time: String = row.get(1)?;
        parse_slot(&date, &time)
    })?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

/// Every open slot in the store, grouped by doctor name.
pub fn list_open_slots_by_doctor(conn: &Connection) -> AppResult<Vec<(String, Slot)>> {
    let mut stmt = conn.prepare(
        "SELECT d.name, a.available_date, a.available_time
         FROM doctors d
         JOIN availability a ON d.id = a.doctor_id
         WHERE a.is_booked = 0
         ORDER BY d.name ASC, date(a.available_date) ASC, time(a.available_time) ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        let name: String = row.get(0)?;
        let date: String = row.get(1)?;
        let time: String = row.get(2)?;
        Ok((name, parse_slot(&date, &time)?))
    })?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

/// `None` when the store has no such slot at all.
pub fn slot_status(
    conn: &Connection,
    doctor: &str,
    slot: &Slot,
) -> AppResult<Option<bool>> {
    let result = conn.query_row(
        "SELECT a.is_booked
         FROM availability a
         JOIN doctors d ON a.doctor_id = d.id
         WHERE d.name = ?1
           AND date(a.available_date) = date(?2)
           AND time(a.available_time) = time(?3)",
        params![doctor, slot.date_str(), slot.time_str()],
        |row| row.get::<_, bool>(0),
    );

    match result {
        Ok(booked) => Ok(Some(booked)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Appointments ──

/// Insert the appointment and take its slot in one transaction. The slot
/// must still be open, otherwise nothing is written.
///
/// Stored dates and times are compared through SQLite's `date()`/`time()` so
/// rows written as `09:00` match the `09:00:00` that `list_open_slots` reports.
pub fn book_appointment(conn: &mut Connection, appt: &Appointment) -> AppResult<()> {
    let date = appt.date_str();
    let time = appt.time_str();

    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO appointments (patient_name, doctor_name, appointment_date, appointment_time)
         VALUES (?1, ?2, ?3, ?4)",
        params![appt.patient, appt.doctor, date, time],
    )?;

    let taken = tx.execute(
        "UPDATE availability SET is_booked = 1
         WHERE doctor_id IN (SELECT id FROM doctors WHERE name = ?1)
           AND date(available_date) = date(?2) AND time(available_time) = time(?3)
           AND is_booked = 0",
        params![appt.doctor, date, time],
    )?;

    if taken == 0 {
        // dropping the transaction rolls the insert back
        return Err(AppError::SlotUnavailable {
            doctor: appt.doctor.clone(),
            date,
            time,
        });
    }

    tx.commit()?;
    Ok(())
}

/// Remove matching appointment rows and free their slot in one transaction.
/// Returns `false` when no appointment matched; that is not an error.
pub fn cancel_appointment(conn: &mut Connection, appt: &Appointment) -> AppResult<bool> {
    let date = appt.date_str();
    let time = appt.time_str();

    let tx = conn.transaction()?;

    let removed = tx.execute(
        "DELETE FROM appointments
         WHERE patient_name = ?1 AND doctor_name = ?2
           AND date(appointment_date) = date(?3) AND time(appointment_time) = time(?4)",
        params![appt.patient, appt.doctor, date, time],
    )?;

    if removed > 0 {
        tx.execute(
            "UPDATE availability SET is_booked = 0
             WHERE doctor_id IN (SELECT id FROM doctors WHERE name = ?1)
               AND date(available_date) = date(?2) AND time(available_time) = time(?3)",
            params![appt.doctor, date, time],
        )?;
    }

    tx.commit()?;
    Ok(removed > 0)
}

pub fn find_appointments(conn: &Connection, patient: &str) -> AppResult<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT patient_name, doctor_name, appointment_date, appointment_time
         FROM appointments WHERE patient_name = ?1
         ORDER BY appointment_date ASC, appointment_time ASC",
    )?;

    let rows = stmt.query_map(params![patient], |row| {
        let patient: String = row.get(0)?;
        let doctor: String = row.get(1)?;
        let date: String = row.get(2)?;
        let time: String = row.get(3)?;
        let slot = parse_slot(&date, &time)?;
        Ok(Appointment {
            patient,
            doctor,
            date: slot.date,
            time: slot.time,
        })
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row?);
    }
    Ok(appointments)
}

fn parse_slot(date: &str, time: &str) -> rusqlite::Result<Slot> {
    Slot::parse(date, time).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
    })
}
