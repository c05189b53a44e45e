//! Attachments and delivery preferences carried alongside a started emergency.
//!
//! The core never processes these; they travel on the event for the
//! delivery collaborators.

use serde::{Deserialize, Serialize};

/// Which channels notifications should go out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMethods {
    pub email: bool,
    pub sms: bool,
    pub messenger: bool,
}

impl Default for ContactMethods {
    fn default() -> Self {
        Self {
            email: true,
            sms: true,
            messenger: false,
        }
    }
}

/// Extra information and files attached to an emergency notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyAttachments {
    pub include_personal_info: bool,
    pub include_medical_info: bool,
    pub include_gps_location: bool,
    pub picture_path: String,
    pub document_path: String,
    pub contact_methods: ContactMethods,
}

impl Default for EmergencyAttachments {
    fn default() -> Self {
        Self {
            include_personal_info: true,
            include_medical_info: true,
            include_gps_location: true,
            picture_path: String::new(),
            document_path: String::new(),
            contact_methods: ContactMethods::default(),
        }
    }
}

impl EmergencyAttachments {
    #[must_use]
    pub fn has_file_attachments(&self) -> bool {
        !self.picture_path.is_empty() || !self.document_path.is_empty()
    }

    #[must_use]
    pub fn has_information_attachments(&self) -> bool {
        self.include_personal_info || self.include_medical_info || self.include_gps_location
    }

    #[must_use]
    pub fn has_contact_methods(&self) -> bool {
        let m = self.contact_methods;
        m.email || m.sms || m.messenger
    }
}
