//! Structured fields extracted from a free-text message.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalizer::{is_known_value, normalize_value};

/// Named attribute of an opportunity message, in storage and digest order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Country,
    City,
    StartDate,
    EndDate,
    RegistrationDeadline,
    Topic,
    InfoPack,
    Form,
    Contact,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Country,
        Field::City,
        Field::StartDate,
        Field::EndDate,
        Field::RegistrationDeadline,
        Field::Topic,
        Field::InfoPack,
        Field::Form,
        Field::Contact,
    ];

    /// Canonical key, also the column name.
    pub fn key(self) -> &'static str {
        match self {
            Field::Country => "country",
            Field::City => "city",
            Field::StartDate => "start_date",
            Field::EndDate => "end_date",
            Field::RegistrationDeadline => "registration_deadline",
            Field::Topic => "topic",
            Field::InfoPack => "info_pack",
            Field::Form => "form",
            Field::Contact => "contact",
        }
    }

    /// Alternative keys accepted from the extractor (Spanish prompt variants, spacing).
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Country => &["pais", "país"],
            Field::City => &["ciudad"],
            Field::StartDate => &["fecha_inicio"],
            Field::EndDate => &["fecha_fin"],
            Field::RegistrationDeadline => &["fecha_limite_inscripcion", "deadline"],
            Field::Topic => &["tematica", "temática"],
            Field::InfoPack => &["infopack"],
            Field::Form => &["formulario"],
            Field::Contact => &["contacto"],
        }
    }

    /// First candidate key (canonical, then aliases) whose value normalizes to something.
    fn lookup(self, raw: &Map<String, Value>) -> Option<String> {
        std::iter::once(self.key())
            .chain(self.aliases().iter().copied())
            .filter_map(|key| raw.get(key))
            .find_map(normalize_value)
    }
}

/// Normalized field values of one record; `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StructuredFields {
    pub country: Option<String>,
    pub city: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub registration_deadline: Option<String>,
    pub topic: Option<String>,
    pub info_pack: Option<String>,
    pub form: Option<String>,
    pub contact: Option<String>,
}

impl StructuredFields {
    /// Normalizes an extractor mapping. Unrecognized keys are ignored.
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        let mut fields = Self::default();
        for field in Field::ALL {
            let value = field.lookup(raw);
            *fields.slot_mut(field) = value;
        }
        fields
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Country => self.country.as_deref(),
            Field::City => self.city.as_deref(),
            Field::StartDate => self.start_date.as_deref(),
            Field::EndDate => self.end_date.as_deref(),
            Field::RegistrationDeadline => self.registration_deadline.as_deref(),
            Field::Topic => self.topic.as_deref(),
            Field::InfoPack => self.info_pack.as_deref(),
            Field::Form => self.form.as_deref(),
            Field::Contact => self.contact.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Country => &mut self.country,
            Field::City => &mut self.city,
            Field::StartDate => &mut self.start_date,
            Field::EndDate => &mut self.end_date,
            Field::RegistrationDeadline => &mut self.registration_deadline,
            Field::Topic => &mut self.topic,
            Field::InfoPack => &mut self.info_pack,
            Field::Form => &mut self.form,
            Field::Contact => &mut self.contact,
        }
    }

    /// Fields in fixed order with their values.
    pub fn iter(&self) -> impl Iterator<Item = (Field, Option<&str>)> + '_ {
        Field::ALL.into_iter().map(move |field| (field, self.get(field)))
    }

    /// Validity gate: at least one field is non-blank and not `unknown`.
    pub fn is_usable(&self) -> bool {
        self.iter()
            .any(|(_, value)| value.map(is_known_value).unwrap_or(false))
    }
}
