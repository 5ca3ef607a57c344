//! Customer-facing notices.
//!
//! Handlers that redirect after a form post carry the outcome in the query
//! string as a short code (`?error=sign_in_failed`, `?notice=reset_sent`).
//! The target page turns the code back into Lithuanian text here, so the
//! text never travels through the URL.

use elida_core::{CartError, ValidationError};

/// A message shown in a page's alert area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    FieldsRequired,
    PasswordTooShort,
    PasswordMismatch,
    SignInFailed,
    SignUpFailed,
    GoogleFailed,
    UnauthorizedDomain,
    ResetFailed,
    ResetSent,
    ProfileUpdated,
    ProfileFailed,
    SessionExpired,
    VariantRequired,
    VariantUnknown,
    CartLineMissing,
    CartEmpty,
    OrderPlaced,
    OrderFailed,
    OrderCancelled,
    OrderNotCancellable,
    CatalogUnavailable,
}

const ALL: &[Notice] = &[
    Notice::FieldsRequired,
    Notice::PasswordTooShort,
    Notice::PasswordMismatch,
    Notice::SignInFailed,
    Notice::SignUpFailed,
    Notice::GoogleFailed,
    Notice::UnauthorizedDomain,
    Notice::ResetFailed,
    Notice::ResetSent,
    Notice::ProfileUpdated,
    Notice::ProfileFailed,
    Notice::SessionExpired,
    Notice::VariantRequired,
    Notice::VariantUnknown,
    Notice::CartLineMissing,
    Notice::CartEmpty,
    Notice::OrderPlaced,
    Notice::OrderFailed,
    Notice::OrderCancelled,
    Notice::OrderNotCancellable,
    Notice::CatalogUnavailable,
];

impl Notice {
    /// Query-string code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::FieldsRequired => "fields_required",
            Self::PasswordTooShort => "password_too_short",
            Self::PasswordMismatch => "password_mismatch",
            Self::SignInFailed => "sign_in_failed",
            Self::SignUpFailed => "sign_up_failed",
            Self::GoogleFailed => "google_failed",
            Self::UnauthorizedDomain => "unauthorized_domain",
            Self::ResetFailed => "reset_failed",
            Self::ResetSent => "reset_sent",
            Self::ProfileUpdated => "profile_updated",
            Self::ProfileFailed => "profile_failed",
            Self::SessionExpired => "session_expired",
            Self::VariantRequired => "variant_required",
            Self::VariantUnknown => "variant_unknown",
            Self::CartLineMissing => "cart_line_missing",
            Self::CartEmpty => "cart_empty",
            Self::OrderPlaced => "order_placed",
            Self::OrderFailed => "order_failed",
            Self::OrderCancelled => "order_cancelled",
            Self::OrderNotCancellable => "order_not_cancellable",
            Self::CatalogUnavailable => "catalog_unavailable",
        }
    }

    /// Text shown to the customer.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::FieldsRequired => "Prašome užpildyti visus laukus",
            Self::PasswordTooShort => "Slaptažodis turi būti bent 6 simbolių ilgio",
            Self::PasswordMismatch => "Slaptažodžiai nesutampa",
            Self::SignInFailed => "Neteisingas el. paštas arba slaptažodis.",
            Self::SignUpFailed => "Nepavyko sukurti paskyros. Bandykite dar kartą.",
            Self::GoogleFailed => "Nepavyko prisijungti su Google. Bandykite dar kartą.",
            Self::UnauthorizedDomain => {
                "Šis domenas nėra autorizuotas autentifikacijai. Prašome susisiekti su administratoriumi."
            }
            Self::ResetFailed => {
                "Nepavyko išsiųsti slaptažodžio atstatymo laiško. Patikrinkite el. pašto adresą."
            }
            Self::ResetSent => "Slaptažodžio atstatymo nuoroda išsiųsta. Patikrinkite savo el. paštą.",
            Self::ProfileUpdated => "Profilis atnaujintas",
            Self::ProfileFailed => "Nepavyko atnaujinti profilio. Bandykite dar kartą.",
            Self::SessionExpired => "Sesija baigėsi. Prisijunkite iš naujo.",
            Self::VariantRequired => "Prašome pasirinkti dydį ir spalvą",
            Self::VariantUnknown => "Pasirinktas variantas neegzistuoja",
            Self::CartLineMissing => "Prekė krepšelyje nerasta",
            Self::CartEmpty => "Jūsų krepšelis tuščias",
            Self::OrderPlaced => "Užsakymas pateiktas. Ačiū!",
            Self::OrderFailed => "Nepavyko pateikti užsakymo. Bandykite dar kartą.",
            Self::OrderCancelled => "Užsakymas atšauktas",
            Self::OrderNotCancellable => "Šio užsakymo atšaukti nebegalima",
            Self::CatalogUnavailable => "Nepavyko užkrauti produktų. Prašome bandyti vėliau.",
        }
    }

    /// Look a code up. Unknown codes are ignored by the pages.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        ALL.iter().copied().find(|n| n.code() == code)
    }

    /// Resolve an optional query parameter straight to display text.
    #[must_use]
    pub fn text_for(code: Option<&str>) -> Option<&'static str> {
        code.and_then(Self::from_code).map(Self::message)
    }
}

impl From<ValidationError> for Notice {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyFields => Self::FieldsRequired,
            ValidationError::PasswordTooShort => Self::PasswordTooShort,
            ValidationError::PasswordMismatch => Self::PasswordMismatch,
            ValidationError::EmptyCart => Self::CartEmpty,
        }
    }
}

impl From<CartError> for Notice {
    fn from(err: CartError) -> Self {
        match err {
            CartError::MissingVariant => Self::VariantRequired,
            CartError::UnknownVariant => Self::VariantUnknown,
            CartError::LineNotFound => Self::CartLineMissing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_and_are_unique() {
        for notice in ALL {
            assert_eq!(Notice::from_code(notice.code()), Some(*notice));
        }
        let mut codes: Vec<_> = ALL.iter().map(|n| n.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ALL.len());
    }

    #[test]
    fn test_unknown_code_is_ignored() {
        assert_eq!(Notice::text_for(Some("<script>")), None);
        assert_eq!(Notice::text_for(None), None);
    }

    #[test]
    fn test_core_errors_share_wording() {
        for err in [
            ValidationError::EmptyFields,
            ValidationError::PasswordTooShort,
            ValidationError::PasswordMismatch,
            ValidationError::EmptyCart,
        ] {
            assert_eq!(Notice::from(err).message(), err.to_string());
        }
        for err in [
            CartError::MissingVariant,
            CartError::UnknownVariant,
            CartError::LineNotFound,
        ] {
            assert_eq!(Notice::from(err.clone()).message(), err.to_string());
        }
    }
}
