//! On-call contact roster

use serde::{Deserialize, Serialize};
use std::fmt;

/// A person who receives alerts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Display name
    pub name: String,
    /// E-mail address alerts are sent to
    pub email: String,
    /// Phone number, informational only
    #[serde(default)]
    pub phone: String,
}

impl Contact {
    /// Create a new contact
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.email)
    }
}

/// Contacts grouped by role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ContactRoster {
    /// Doctors on call
    pub doctors: Vec<Contact>,
    /// Nurses on call
    pub nurses: Vec<Contact>,
}

impl ContactRoster {
    /// Create a roster from doctors and nurses
    pub fn new(doctors: Vec<Contact>, nurses: Vec<Contact>) -> Self {
        Self { doctors, nurses }
    }

    /// Alert recipients: doctors then nurses, first occurrence of each address kept
    pub fn recipients(&self) -> Vec<String> {
        let mut recipients: Vec<String> = Vec::new();
        for contact in self.doctors.iter().chain(self.nurses.iter()) {
            if !recipients.contains(&contact.email) {
                recipients.push(contact.email.clone());
            }
        }
        recipients
    }

    /// Total number of people on the roster
    pub fn len(&self) -> usize {
        self.doctors.len() + self.nurses.len()
    }

    /// Whether the roster has nobody on it
    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty() && self.nurses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_display() {
        let contact = Contact::new("Nurse Alice", "nurse1@hospital.com", "");
        assert_eq!(contact.to_string(), "Nurse Alice (nurse1@hospital.com)");
    }

    fn roster() -> ContactRoster {
        ContactRoster::new(
            vec![
                Contact::new("Dr. John Doe", "doctor1@hospital.com", "+1-234-567-8900"),
                Contact::new("Dr. Jane Smith", "doctor2@hospital.com", "+1-234-567-8901"),
            ],
            vec![
                Contact::new("Nurse Alice", "nurse1@hospital.com", "+1-234-567-8902"),
                Contact::new("Nurse Bob", "nurse2@hospital.com", "+1-234-567-8903"),
            ],
        )
    }

    #[test]
    fn test_recipients_union_in_order() {
        assert_eq!(
            roster().recipients(),
            vec![
                "doctor1@hospital.com",
                "doctor2@hospital.com",
                "nurse1@hospital.com",
                "nurse2@hospital.com",
            ]
        );
    }

    #[test]
    fn test_recipients_deduplicated() {
        let mut roster = roster();
        // Doctor who also covers a nursing shift
        roster
            .nurses
            .push(Contact::new("Dr. Jane Smith", "doctor2@hospital.com", ""));
        roster
            .doctors
            .push(Contact::new("Dr. John Doe", "doctor1@hospital.com", ""));

        let recipients = roster.recipients();
        assert_eq!(recipients.len(), 4);
        assert_eq!(roster.len(), 6);
    }

    #[test]
    fn test_empty_roster() {
        let roster = ContactRoster::default();
        assert!(roster.is_empty());
        assert!(roster.recipients().is_empty());
    }
}
