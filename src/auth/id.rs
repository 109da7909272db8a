//! Validated app identifiers for the component and its authorizers.
//!
//! Platform app ids are short ASCII tokens (`wx` followed by 16 hex digits for official
//! accounts and mini programs). Validation stays a little looser than that so sandbox and test
//! ids still pass, but anything that could not be sent verbatim in a query string is rejected.

// self
use crate::_prelude::*;

/// Longest app id accepted.
pub const APPID_MAX_LEN: usize = 32;

macro_rules! def_appid {
	($name:ident, $kind:literal, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value` as an app id.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				validate_appid($kind, &value)?;

				Ok(Self(value))
			}

			/// Borrows the app id.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				self.as_str()
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

def_appid!(ComponentAppId, "Component", "App id of the third-party platform component.");
def_appid!(
	AuthorizerAppId,
	"Authorizer",
	"App id of a tenant (official account or mini program) that authorized the component."
);

/// App id validation failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// Empty app id.
	#[error("{kind} app id cannot be empty.")]
	Empty {
		/// `Component` or `Authorizer`.
		kind: &'static str,
	},
	/// Character outside `[A-Za-z0-9_-]`.
	#[error("{kind} app id contains invalid character {character:?}.")]
	InvalidCharacter {
		/// `Component` or `Authorizer`.
		kind: &'static str,
		/// First offending character.
		character: char,
	},
	/// Longer than [`APPID_MAX_LEN`].
	#[error("{kind} app id exceeds {max} characters.")]
	TooLong {
		/// `Component` or `Authorizer`.
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

fn validate_appid(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
	if value.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if let Some(character) =
		value.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_')))
	{
		return Err(IdentifierError::InvalidCharacter { kind, character });
	}
	if value.len() > APPID_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: APPID_MAX_LEN });
	}

	Ok(())
}
