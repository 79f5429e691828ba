//! Decoding of token ownership rows from the indexing service.
//!
//! Rows carry contract terms as token properties: boolean flags as the
//! strings `"true"`/`"false"`, strike and maturity as `0x`-prefixed hex of
//! their UTF-8 decimal text, and the settlement price in hundredths. This
//! module turns one row into an [`OptionRecord`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::{cents_to_strike, Direction, OptionKind, TokenName};
use crate::records::{LifecycleError, OptionRecord, RecordFields};

/// Errors from decoding indexer rows.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    /// Hex string with an odd length or a non-hex digit.
    #[error("Malformed hex string: {0}")]
    InvalidHex(String),

    /// Decoded bytes are not UTF-8.
    #[error("Hex payload is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    /// A numeric field does not parse.
    #[error("Invalid number in {field}: {value:?}")]
    InvalidNumber {
        /// Property name
        field: &'static str,
        /// Raw value
        value: String,
    },

    /// A flag is neither `"true"` nor `"false"`.
    #[error("Invalid flag in {field}: {value:?}")]
    InvalidFlag {
        /// Property name
        field: &'static str,
        /// Raw value
        value: String,
    },

    /// A required property is absent.
    #[error("Missing property: {0}")]
    MissingProperty(&'static str),

    /// The decoded terms do not form a valid record.
    #[error(transparent)]
    Record(#[from] LifecycleError),
}

/// A number the indexer may send either as JSON number or as string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    /// Plain JSON integer.
    Int(u64),
    /// Decimal text.
    Text(String),
}

impl Numeric {
    fn parse(&self, field: &'static str) -> Result<u64, DecodeError> {
        match self {
            Numeric::Int(value) => Ok(*value),
            Numeric::Text(text) => parse_number(field, text),
        }
    }
}

/// Token properties relevant to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenProperties {
    /// `"true"` for Long, `"false"` for Short.
    pub direction_type: Option<String>,
    /// `"true"` for Call, `"false"` for Put.
    pub option_type: Option<String>,
    /// Strike in hundredths, hex-encoded or plain.
    pub strike_price: Option<String>,
    /// Maturity in UTC milliseconds, hex-encoded or plain.
    pub maturity: Option<String>,
    /// Settlement price in hundredths; `0` or absent before settlement.
    pub last_price_at_maturity: Option<Numeric>,
}

/// Token data attached to an ownership row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenData {
    /// Total supply of the token.
    pub supply: Option<Numeric>,
    /// Contract terms.
    pub default_properties: TokenProperties,
}

/// One token ownership row.
///
/// # Examples
/// ```
/// use cashopt_engine::contract::{Direction, OptionKind};
/// use cashopt_engine::indexer::IndexedToken;
/// use cashopt_engine::records::OptionRecord;
///
/// let row = r#"{
///     "amount": "3",
///     "name": "APT_1675411200000_1850_PUT_SHORT",
///     "owner_address": "0xabc",
///     "current_token_data": {
///         "default_properties": {
///             "direction_type": "false",
///             "option_type": "false",
///             "strike_price": "0x31383530",
///             "maturity": "0x31363735343131323030303030",
///             "last_price_at_maturity": "1725"
///         }
///     }
/// }"#;
/// let token: IndexedToken = serde_json::from_str(row).unwrap();
/// let record = OptionRecord::try_from(token).unwrap();
///
/// assert_eq!(record.kind(), OptionKind::Put);
/// assert_eq!(record.direction(), Direction::Short);
/// assert_eq!(record.strike(), 18.5);
/// assert_eq!(record.maturity_ms(), 1_675_411_200_000);
/// assert_eq!(record.amount(), 3);
/// assert_eq!(record.settlement_price(), Some(17.25));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedToken {
    /// Quantity held.
    pub amount: Numeric,
    /// Ledger token name.
    #[serde(default)]
    pub name: String,
    /// Holder address.
    #[serde(default)]
    pub owner_address: String,
    /// Token data with the contract terms.
    #[serde(default)]
    pub current_token_data: TokenData,
}

impl IndexedToken {
    /// The token name parsed, if it is in ledger format.
    pub fn token_name(&self) -> Option<TokenName> {
        self.name.parse().ok()
    }
}

/// Decodes `0x`-prefixed hex to UTF-8 text; other input is returned as is.
///
/// # Examples
/// ```
/// use cashopt_engine::indexer::hex_to_utf8;
///
/// assert_eq!(hex_to_utf8("0x31383030").unwrap(), "1800");
/// assert_eq!(hex_to_utf8("1800").unwrap(), "1800");
/// assert!(hex_to_utf8("0x3").is_err());
/// ```
pub fn hex_to_utf8(input: &str) -> Result<String, DecodeError> {
    let Some(hex) = input.strip_prefix("0x") else {
        return Ok(input.to_string());
    };
    if hex.len() % 2 != 0 {
        return Err(DecodeError::InvalidHex(input.to_string()));
    }

    let bytes = (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| DecodeError::InvalidHex(input.to_string()))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8(input.to_string()))
}

fn parse_number(field: &'static str, text: &str) -> Result<u64, DecodeError> {
    text.trim().parse().map_err(|_| DecodeError::InvalidNumber {
        field,
        value: text.to_string(),
    })
}

fn parse_flag(field: &'static str, value: Option<&str>) -> Result<bool, DecodeError> {
    match value {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(DecodeError::InvalidFlag {
            field,
            value: other.to_string(),
        }),
        None => Err(DecodeError::MissingProperty(field)),
    }
}

/// Decodes a strike property to a price.
pub fn decode_strike(raw: &str) -> Result<f64, DecodeError> {
    let text = hex_to_utf8(raw)?;
    parse_number("strike_price", &text).map(cents_to_strike)
}

/// Decodes a maturity property to UTC milliseconds.
pub fn decode_maturity(raw: &str) -> Result<i64, DecodeError> {
    let text = hex_to_utf8(raw)?;
    text.trim().parse().map_err(|_| DecodeError::InvalidNumber {
        field: "maturity",
        value: text,
    })
}

/// Decodes a settlement price in hundredths; 0 means not yet recorded.
pub fn decode_settlement_price(raw: &Numeric) -> Result<Option<f64>, DecodeError> {
    let cents = raw.parse("last_price_at_maturity")?;
    Ok((cents > 0).then(|| cents_to_strike(cents)))
}

impl TryFrom<IndexedToken> for OptionRecord {
    type Error = DecodeError;

    fn try_from(token: IndexedToken) -> Result<Self, Self::Error> {
        let props = &token.current_token_data.default_properties;

        let direction = if parse_flag("direction_type", props.direction_type.as_deref())? {
            Direction::Long
        } else {
            Direction::Short
        };
        let kind = if parse_flag("option_type", props.option_type.as_deref())? {
            OptionKind::Call
        } else {
            OptionKind::Put
        };
        let strike = decode_strike(
            props
                .strike_price
                .as_deref()
                .ok_or(DecodeError::MissingProperty("strike_price"))?,
        )?;
        let maturity_ms = decode_maturity(
            props
                .maturity
                .as_deref()
                .ok_or(DecodeError::MissingProperty("maturity"))?,
        )?;
        let settlement_price = match &props.last_price_at_maturity {
            Some(raw) => decode_settlement_price(raw)?,
            None => None,
        };

        let record = OptionRecord::try_from(RecordFields {
            kind,
            direction,
            strike,
            maturity_ms,
            amount: token.amount.parse("amount")?,
            remaining: None,
            settlement_price,
        })?;
        Ok(record)
    }
}

/// Decodes a batch of rows, skipping and logging the ones that fail.
pub fn decode_rows(rows: Vec<IndexedToken>) -> Vec<OptionRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let name = row.name.clone();
            OptionRecord::try_from(row)
                .inspect_err(|err| tracing::warn!(token = %name, error = %err, "skipping undecodable row"))
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_hex(text: &str) -> String {
        let digits: String = text.bytes().map(|b| format!("{b:02x}")).collect();
        format!("0x{digits}")
    }

    fn row(direction: &str, option: &str, strike: &str, maturity: &str) -> IndexedToken {
        IndexedToken {
            amount: Numeric::Text("2".to_string()),
            name: String::new(),
            owner_address: "0x1".to_string(),
            current_token_data: TokenData {
                supply: None,
                default_properties: TokenProperties {
                    direction_type: Some(direction.to_string()),
                    option_type: Some(option.to_string()),
                    strike_price: Some(strike.to_string()),
                    maturity: Some(maturity.to_string()),
                    last_price_at_maturity: Some(Numeric::Int(0)),
                },
            },
        }
    }

    #[test]
    fn test_hex_to_utf8() {
        assert_eq!(hex_to_utf8(&to_hex("1675411200000")).unwrap(), "1675411200000");
        assert_eq!(hex_to_utf8("0x").unwrap(), "");
        assert!(matches!(hex_to_utf8("0xzz"), Err(DecodeError::InvalidHex(_))));
        assert!(matches!(hex_to_utf8("0xff"), Err(DecodeError::InvalidUtf8(_))));
    }

    #[test]
    fn test_decode_fields() {
        assert_eq!(decode_strike(&to_hex("1650")).unwrap(), 16.5);
        assert_eq!(decode_strike("1800").unwrap(), 18.0);
        assert_eq!(decode_maturity("1675411200000").unwrap(), 1_675_411_200_000);
        assert!(matches!(
            decode_strike(&to_hex("18.5")),
            Err(DecodeError::InvalidNumber { field: "strike_price", .. })
        ));
        assert_eq!(decode_settlement_price(&Numeric::Text("0".into())).unwrap(), None);
        assert_eq!(decode_settlement_price(&Numeric::Int(2050)).unwrap(), Some(20.5));
    }

    #[test]
    fn test_row_to_record() {
        let record = OptionRecord::try_from(row("true", "true", &to_hex("1800"), "1675411200000")).unwrap();
        assert_eq!(record.kind(), OptionKind::Call);
        assert_eq!(record.direction(), Direction::Long);
        assert_eq!(record.strike(), 18.0);
        assert_eq!(record.remaining(), 2);
        assert_eq!(record.settlement_price(), None);
    }

    #[test]
    fn test_bad_rows() {
        assert!(matches!(
            OptionRecord::try_from(row("yes", "true", "1800", "1")),
            Err(DecodeError::InvalidFlag { field: "direction_type", .. })
        ));
        assert!(matches!(
            OptionRecord::try_from(row("true", "true", "0", "1")),
            Err(DecodeError::Record(LifecycleError::InvalidStrike { .. }))
        ));

        let mut missing = row("true", "true", "1800", "1");
        missing.current_token_data.default_properties.maturity = None;
        assert_eq!(
            OptionRecord::try_from(missing),
            Err(DecodeError::MissingProperty("maturity"))
        );
    }

    #[test]
    fn test_decode_rows_skips_failures() {
        let rows = vec![
            row("true", "false", "1800", "1"),
            row("maybe", "false", "1800", "1"),
            row("false", "false", "1750", "1"),
        ];
        let records = decode_rows(rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].strike(), 17.5);
    }

    #[test]
    fn test_deserialize_numeric_amount() {
        let json = r#"{ "amount": 4, "current_token_data": { "default_properties": {} } }"#;
        let token: IndexedToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.amount, Numeric::Int(4));
        assert_eq!(
            OptionRecord::try_from(token),
            Err(DecodeError::MissingProperty("direction_type"))
        );
    }
}
