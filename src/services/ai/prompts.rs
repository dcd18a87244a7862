use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::Slot;

const REPLY_FORMAT: &str = "Patient: <patient name>\nDoctor: <doctor name>\nDate: <YYYY-MM-DD>\nTime: <HH:MM:SS>";

pub fn client_side_prompt(today: NaiveDate) -> String {
    format!(
        "You are a helpful healthcare assistant. Today is {today}.\n\
         You help users book and cancel appointments with doctors.\n\
         You must extract or ask for: patient name, doctor name, date (YYYY-MM-DD), and time (HH:MM:SS).\n\
         If a user wants to cancel, say 'Understood, I will cancel the appointment.'\n\
         If a user wants to book, say 'I'm ready to book the appointment.'\n\
         Write 'not provided' for any field you do not know yet.\n\
         Always reply in this format:\n{REPLY_FORMAT}",
        today = today.format("%Y-%m-%d"),
    )
}

pub fn model_assisted_prompt(today: NaiveDate, availability: &BTreeMap<String, Vec<Slot>>) -> String {
    let doctor_list = availability
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a helpful healthcare assistant. Today's date is {today}.\n\
         You help users book appointments with doctors based on available slots.\n\
         Here are the current available appointment slots:\n{table}\n\n\
         Only accept doctor names from this list: {doctor_list}.\n\
         If a user names a doctor not in the list, tell them and ask them to choose a valid doctor.\n\n\
         Verify that the doctor is available exactly on the requested date and time.\n\
         If the requested slot is not in the list above, respond with:\n\
         'Sorry, Dr. <name> is not available on <date> at <time>. Please choose another available slot.'\n\n\
         Only when the user has given the patient's name, the doctor's name, the date and the time \
         and the slot is available, respond with:\n{REPLY_FORMAT}\n\
         If anything is missing, ask only for the missing fields and do not repeat the ones already provided.",
        today = today.format("%Y-%m-%d"),
        table = availability_table(availability),
    )
}

/// One line per doctor: `Dr. Smith: 2024-06-01 at 09:00:00, 2024-06-02 at 10:00:00`.
pub fn availability_table(availability: &BTreeMap<String, Vec<Slot>>) -> String {
    if availability.is_empty() {
        return "(no open slots)".to_string();
    }

    availability
        .iter()
        .map(|(doctor, slots)| {
            let slots = slots
                .iter()
                .map(Slot::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("Dr. {doctor}: {slots}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
