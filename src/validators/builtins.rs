//! XSD Built-in Types
//!
//! The built-in simple type hierarchy of XML Schema Part 2, with the lexical
//! parsers that map a whitespace-normalized literal into its value space.
//!
//! The registry is built once; every built-in is a shared `XsdSimpleType`
//! so that user types can derive from them by `Arc`.

use std::str::FromStr;
use std::sync::Arc;

use base64::Engine as _;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::namespaces::{NamespaceContext, QName, XSD_NAMESPACE};
use crate::names::{is_valid_name, is_valid_ncname, is_valid_nmtoken, split_qname};

use super::derivation::DerivationFlags;
use super::facets::{FacetSet, WhiteSpace};
use super::simple_types::{
    AtomicValue, InvalidValue, SimpleTypeVariety, TimelineValue, Value, XsdSimpleType,
};

/// Key reported when a literal is not in the lexical space of its type
const INVALID_LITERAL: &str = "cvc-datatype-valid.1.2.1";

/// Primitive value spaces; values of different primitives are never equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    AnySimpleType,
    String,
    Boolean,
    Decimal,
    Float,
    Double,
    Duration,
    DateTime,
    Time,
    Date,
    GYearMonth,
    GYear,
    GMonthDay,
    GDay,
    GMonth,
    HexBinary,
    Base64Binary,
    AnyUri,
    QName,
    Notation,
}

/// Built-in simple types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    AnySimpleType,
    // primitives
    String,
    Boolean,
    Decimal,
    Float,
    Double,
    Duration,
    DateTime,
    Time,
    Date,
    GYearMonth,
    GYear,
    GMonthDay,
    GDay,
    GMonth,
    HexBinary,
    Base64Binary,
    AnyUri,
    QName,
    Notation,
    // derived from string
    NormalizedString,
    Token,
    Language,
    NmToken,
    NmTokens,
    Name,
    NcName,
    Id,
    IdRef,
    IdRefs,
    Entity,
    Entities,
    // derived from decimal
    Integer,
    NonPositiveInteger,
    NegativeInteger,
    Long,
    Int,
    Short,
    Byte,
    NonNegativeInteger,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    PositiveInteger,
}

impl BuiltinKind {
    /// All built-ins, each listed after its base type
    pub const ALL: [BuiltinKind; 45] = [
        BuiltinKind::AnySimpleType,
        BuiltinKind::String,
        BuiltinKind::Boolean,
        BuiltinKind::Decimal,
        BuiltinKind::Float,
        BuiltinKind::Double,
        BuiltinKind::Duration,
        BuiltinKind::DateTime,
        BuiltinKind::Time,
        BuiltinKind::Date,
        BuiltinKind::GYearMonth,
        BuiltinKind::GYear,
        BuiltinKind::GMonthDay,
        BuiltinKind::GDay,
        BuiltinKind::GMonth,
        BuiltinKind::HexBinary,
        BuiltinKind::Base64Binary,
        BuiltinKind::AnyUri,
        BuiltinKind::QName,
        BuiltinKind::Notation,
        BuiltinKind::NormalizedString,
        BuiltinKind::Token,
        BuiltinKind::Language,
        BuiltinKind::NmToken,
        BuiltinKind::NmTokens,
        BuiltinKind::Name,
        BuiltinKind::NcName,
        BuiltinKind::Id,
        BuiltinKind::IdRef,
        BuiltinKind::IdRefs,
        BuiltinKind::Entity,
        BuiltinKind::Entities,
        BuiltinKind::Integer,
        BuiltinKind::NonPositiveInteger,
        BuiltinKind::NegativeInteger,
        BuiltinKind::Long,
        BuiltinKind::Int,
        BuiltinKind::Short,
        BuiltinKind::Byte,
        BuiltinKind::NonNegativeInteger,
        BuiltinKind::UnsignedLong,
        BuiltinKind::UnsignedInt,
        BuiltinKind::UnsignedShort,
        BuiltinKind::UnsignedByte,
        BuiltinKind::PositiveInteger,
    ];

    /// Local name in the XSD namespace
    pub fn name(self) -> &'static str {
        use BuiltinKind::*;
        match self {
            AnySimpleType => "anySimpleType",
            String => "string",
            Boolean => "boolean",
            Decimal => "decimal",
            Float => "float",
            Double => "double",
            Duration => "duration",
            DateTime => "dateTime",
            Time => "time",
            Date => "date",
            GYearMonth => "gYearMonth",
            GYear => "gYear",
            GMonthDay => "gMonthDay",
            GDay => "gDay",
            GMonth => "gMonth",
            HexBinary => "hexBinary",
            Base64Binary => "base64Binary",
            AnyUri => "anyURI",
            Self::QName => "QName",
            Notation => "NOTATION",
            NormalizedString => "normalizedString",
            Token => "token",
            Language => "language",
            NmToken => "NMTOKEN",
            NmTokens => "NMTOKENS",
            Name => "Name",
            NcName => "NCName",
            Id => "ID",
            IdRef => "IDREF",
            IdRefs => "IDREFS",
            Entity => "ENTITY",
            Entities => "ENTITIES",
            Integer => "integer",
            NonPositiveInteger => "nonPositiveInteger",
            NegativeInteger => "negativeInteger",
            Long => "long",
            Int => "int",
            Short => "short",
            Byte => "byte",
            NonNegativeInteger => "nonNegativeInteger",
            UnsignedLong => "unsignedLong",
            UnsignedInt => "unsignedInt",
            UnsignedShort => "unsignedShort",
            UnsignedByte => "unsignedByte",
            PositiveInteger => "positiveInteger",
        }
    }

    /// Look up a built-in by local name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Base type in the built-in hierarchy
    pub fn base(self) -> Option<BuiltinKind> {
        use BuiltinKind::*;
        Some(match self {
            AnySimpleType => return None,
            NormalizedString => String,
            Token => NormalizedString,
            Language | NmToken | Name => Token,
            NcName => Name,
            Id | IdRef | Entity => NcName,
            Integer => Decimal,
            NonPositiveInteger | Long | NonNegativeInteger => Integer,
            NegativeInteger => NonPositiveInteger,
            Int => Long,
            Short => Int,
            Byte => Short,
            UnsignedLong | PositiveInteger => NonNegativeInteger,
            UnsignedInt => UnsignedLong,
            UnsignedShort => UnsignedInt,
            UnsignedByte => UnsignedShort,
            _ => AnySimpleType,
        })
    }

    /// Item type of the built-in list types
    pub fn list_item(self) -> Option<BuiltinKind> {
        match self {
            BuiltinKind::NmTokens => Some(BuiltinKind::NmToken),
            BuiltinKind::IdRefs => Some(BuiltinKind::IdRef),
            BuiltinKind::Entities => Some(BuiltinKind::Entity),
            _ => None,
        }
    }

    /// Primitive value space
    pub fn primitive(self) -> Primitive {
        use BuiltinKind::*;
        match self {
            AnySimpleType => Primitive::AnySimpleType,
            Boolean => Primitive::Boolean,
            Float => Primitive::Float,
            Double => Primitive::Double,
            Duration => Primitive::Duration,
            DateTime => Primitive::DateTime,
            Time => Primitive::Time,
            Date => Primitive::Date,
            GYearMonth => Primitive::GYearMonth,
            GYear => Primitive::GYear,
            GMonthDay => Primitive::GMonthDay,
            GDay => Primitive::GDay,
            GMonth => Primitive::GMonth,
            HexBinary => Primitive::HexBinary,
            Base64Binary => Primitive::Base64Binary,
            AnyUri => Primitive::AnyUri,
            Self::QName => Primitive::QName,
            Notation => Primitive::Notation,
            Decimal | Integer | NonPositiveInteger | NegativeInteger | Long | Int | Short | Byte
            | NonNegativeInteger | UnsignedLong | UnsignedInt | UnsignedShort | UnsignedByte
            | PositiveInteger => Primitive::Decimal,
            _ => Primitive::String,
        }
    }

    /// Fixed whiteSpace facet of the built-in
    pub fn white_space(self) -> WhiteSpace {
        match self {
            BuiltinKind::AnySimpleType | BuiltinKind::String => WhiteSpace::Preserve,
            BuiltinKind::NormalizedString => WhiteSpace::Replace,
            _ => WhiteSpace::Collapse,
        }
    }

    fn integer_range(self) -> Option<(Option<i128>, Option<i128>)> {
        use BuiltinKind::*;
        Some(match self {
            Integer => (None, None),
            NonPositiveInteger => (None, Some(0)),
            NegativeInteger => (None, Some(-1)),
            Long => (Some(i64::MIN as i128), Some(i64::MAX as i128)),
            Int => (Some(i32::MIN as i128), Some(i32::MAX as i128)),
            Short => (Some(i16::MIN as i128), Some(i16::MAX as i128)),
            Byte => (Some(i8::MIN as i128), Some(i8::MAX as i128)),
            NonNegativeInteger => (Some(0), None),
            UnsignedLong => (Some(0), Some(u64::MAX as i128)),
            UnsignedInt => (Some(0), Some(u32::MAX as i128)),
            UnsignedShort => (Some(0), Some(u16::MAX as i128)),
            UnsignedByte => (Some(0), Some(u8::MAX as i128)),
            PositiveInteger => (Some(1), None),
            _ => return None,
        })
    }
}

lazy_static::lazy_static! {
    /// Registry of all built-in simple types
    static ref BUILTIN_TYPES: IndexMap<BuiltinKind, Arc<XsdSimpleType>> = {
        let mut registry: IndexMap<BuiltinKind, Arc<XsdSimpleType>> = IndexMap::new();
        for kind in BuiltinKind::ALL {
            let base = kind.base().and_then(|b| registry.get(&b).cloned());
            let variety = match kind.list_item().and_then(|item| registry.get(&item)) {
                Some(item) => SimpleTypeVariety::List(Arc::clone(item)),
                None => SimpleTypeVariety::Atomic,
            };
            let t = XsdSimpleType {
                name: Some(QName::xsd(kind.name())),
                base,
                variety,
                builtin: Some(kind),
                facets: FacetSet::default(),
                final_deriv: DerivationFlags::default(),
            };
            registry.insert(kind, Arc::new(t));
        }
        registry
    };
}

/// Get a built-in type
pub fn builtin(kind: BuiltinKind) -> Arc<XsdSimpleType> {
    Arc::clone(&BUILTIN_TYPES[&kind])
}

/// The anySimpleType definition
pub fn any_simple_type() -> Arc<XsdSimpleType> {
    builtin(BuiltinKind::AnySimpleType)
}

/// Look up a built-in simple type by qualified name
pub fn lookup(name: &QName) -> Option<Arc<XsdSimpleType>> {
    if name.ns() != Some(XSD_NAMESPACE) {
        return None;
    }
    BuiltinKind::from_name(&name.local_name).map(builtin)
}

/// Parse a literal of a built-in atomic type, normalizing it first
pub fn atomic(kind: BuiltinKind, literal: &str) -> Result<AtomicValue, InvalidValue> {
    let normalized = kind.white_space().normalize(literal);
    parse_lexical(kind, &normalized, &NamespaceContext::new())
        .map_err(|key| InvalidValue::new(key, [normalized, kind.name().to_string()]))
}

/// Map a normalized literal into the value space of an atomic built-in.
///
/// Returns the message key on failure.
pub fn parse_lexical(
    kind: BuiltinKind,
    normalized: &str,
    namespaces: &NamespaceContext,
) -> Result<AtomicValue, &'static str> {
    use BuiltinKind as K;

    let value = match kind {
        K::AnySimpleType | K::String | K::NormalizedString | K::Token => {
            Value::String(normalized.to_string())
        }
        K::Language => {
            static LANGUAGE: Lazy<Regex> =
                Lazy::new(|| Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").unwrap());
            check(LANGUAGE.is_match(normalized))?;
            Value::String(normalized.to_string())
        }
        K::NmToken => {
            check(is_valid_nmtoken(normalized))?;
            Value::String(normalized.to_string())
        }
        K::Name => {
            check(is_valid_name(normalized))?;
            Value::String(normalized.to_string())
        }
        K::NcName | K::Id | K::IdRef | K::Entity => {
            check(is_valid_ncname(normalized))?;
            Value::String(normalized.to_string())
        }
        K::Boolean => Value::Boolean(match normalized {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => return Err(INVALID_LITERAL),
        }),
        K::Decimal => Value::Decimal(parse_decimal(normalized)?),
        K::Float => Value::Float(parse_double(normalized)? as f32 as f64),
        K::Double => Value::Float(parse_double(normalized)?),
        K::Duration => {
            static DURATION: Lazy<Regex> = Lazy::new(|| {
                Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$").unwrap()
            });
            check(
                DURATION.is_match(normalized)
                    && !normalized.ends_with('P')
                    && !normalized.ends_with('T'),
            )?;
            Value::String(normalized.to_string())
        }
        K::DateTime => Value::Timeline(parse_date_time(normalized)?),
        K::Date => Value::Timeline(parse_date(normalized)?),
        K::Time => Value::Timeline(parse_time(normalized)?),
        K::GYearMonth | K::GYear | K::GMonthDay | K::GDay | K::GMonth => {
            check(gregorian_pattern(kind).is_match(normalized))?;
            Value::String(normalized.to_string())
        }
        K::HexBinary => Value::Binary(parse_hex(normalized)?),
        K::Base64Binary => {
            let compact: String = normalized.chars().filter(|c| *c != ' ').collect();
            Value::Binary(
                base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|_| INVALID_LITERAL)?,
            )
        }
        K::AnyUri => {
            check(is_any_uri(normalized))?;
            Value::String(normalized.to_string())
        }
        K::QName | K::Notation => {
            let (prefix, local) = split_qname(normalized);
            check(is_valid_ncname(local))?;
            let namespace = match prefix {
                Some(prefix) => {
                    check(is_valid_ncname(prefix))?;
                    Some(namespaces.get_namespace(prefix).ok_or("UndeclaredPrefix")?)
                }
                None => namespaces.get_default_namespace(),
            };
            Value::QName(QName::new(namespace, local))
        }
        K::Integer
        | K::NonPositiveInteger
        | K::NegativeInteger
        | K::Long
        | K::Int
        | K::Short
        | K::Byte
        | K::NonNegativeInteger
        | K::UnsignedLong
        | K::UnsignedInt
        | K::UnsignedShort
        | K::UnsignedByte
        | K::PositiveInteger => Value::Decimal(parse_integer(kind, normalized)?),
        K::NmTokens | K::IdRefs | K::Entities => return Err(INVALID_LITERAL),
    };

    Ok(AtomicValue {
        primitive: kind.primitive(),
        value,
        lexical: normalized.to_string(),
    })
}

fn check(ok: bool) -> Result<(), &'static str> {
    if ok {
        Ok(())
    } else {
        Err(INVALID_LITERAL)
    }
}

fn parse_decimal(s: &str) -> Result<Decimal, &'static str> {
    static DECIMAL: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").unwrap());
    check(DECIMAL.is_match(s))?;
    let (negative, digits) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let mut text = String::with_capacity(digits.len() + 2);
    if negative {
        text.push('-');
    }
    if digits.starts_with('.') {
        text.push('0');
    }
    text.push_str(digits.trim_end_matches('.'));
    Decimal::from_str(&text).map_err(|_| INVALID_LITERAL)
}

fn parse_integer(kind: BuiltinKind, s: &str) -> Result<Decimal, &'static str> {
    static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());
    check(INTEGER.is_match(s))?;
    let value = parse_decimal(s)?;
    if let Some((min, max)) = kind.integer_range() {
        if let Some(min) = min {
            check(value >= Decimal::from_i128_with_scale(min, 0))?;
        }
        if let Some(max) = max {
            check(value <= Decimal::from_i128_with_scale(max, 0))?;
        }
    }
    Ok(value)
}

fn parse_double(s: &str) -> Result<f64, &'static str> {
    match s {
        "INF" | "+INF" => return Ok(f64::INFINITY),
        "-INF" => return Ok(f64::NEG_INFINITY),
        "NaN" => return Ok(f64::NAN),
        _ => {}
    }
    static FLOAT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").unwrap());
    check(FLOAT.is_match(s))?;
    s.parse::<f64>().map_err(|_| INVALID_LITERAL)
}

fn parse_hex(s: &str) -> Result<Vec<u8>, &'static str> {
    check(s.len() % 2 == 0)?;
    (0..s.len())
        .step_by(2)
        .map(|i| s.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect::<Option<Vec<u8>>>()
        .ok_or(INVALID_LITERAL)
}

fn is_any_uri(s: &str) -> bool {
    static SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:").unwrap());
    if s.contains(['\n', '\r', '\t']) {
        return false;
    }
    // an absolute reference has to parse as a URL
    !SCHEME.is_match(s) || url::Url::parse(s).is_ok()
}

fn gregorian_pattern(kind: BuiltinKind) -> &'static Regex {
    static GYEAR_MONTH: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^-?\d{4,}-(0[1-9]|1[0-2])(Z|[+-]\d{2}:\d{2})?$").unwrap());
    static GYEAR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^-?\d{4,}(Z|[+-]\d{2}:\d{2})?$").unwrap());
    static GMONTH_DAY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^--(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])(Z|[+-]\d{2}:\d{2})?$").unwrap()
    });
    static GDAY: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^---(0[1-9]|[12]\d|3[01])(Z|[+-]\d{2}:\d{2})?$").unwrap());
    static GMONTH: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^--(0[1-9]|1[0-2])(Z|[+-]\d{2}:\d{2})?$").unwrap());
    match kind {
        BuiltinKind::GYearMonth => &GYEAR_MONTH,
        BuiltinKind::GYear => &GYEAR,
        BuiltinKind::GMonthDay => &GMONTH_DAY,
        BuiltinKind::GDay => &GDAY,
        _ => &GMONTH,
    }
}

/// Timezone offset in minutes
fn parse_timezone(tz: Option<&str>) -> Result<Option<i64>, &'static str> {
    let tz = match tz {
        None => return Ok(None),
        Some("Z") => return Ok(Some(0)),
        Some(tz) => tz,
    };
    let sign = if tz.starts_with('-') { -1 } else { 1 };
    let hours: i64 = tz[1..3].parse().map_err(|_| INVALID_LITERAL)?;
    let minutes: i64 = tz[4..6].parse().map_err(|_| INVALID_LITERAL)?;
    check(hours < 14 || (hours == 14 && minutes == 0))?;
    check(minutes < 60)?;
    Ok(Some(sign * (hours * 60 + minutes)))
}

fn parse_clock(h: &str, m: &str, s: &str) -> Result<(NaiveTime, bool), &'static str> {
    let hour: u32 = h.parse().map_err(|_| INVALID_LITERAL)?;
    let minute: u32 = m.parse().map_err(|_| INVALID_LITERAL)?;
    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
    let second: u32 = whole.parse().map_err(|_| INVALID_LITERAL)?;
    let nanos: u32 = if fraction.is_empty() {
        0
    } else {
        let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
        digits.parse().map_err(|_| INVALID_LITERAL)?
    };
    // 24:00:00 is the first instant of the next day
    if hour == 24 {
        check(minute == 0 && second == 0 && nanos == 0)?;
        return Ok((NaiveTime::MIN, true));
    }
    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos).ok_or(INVALID_LITERAL)?;
    Ok((time, false))
}

fn timeline(
    date: NaiveDate,
    time: NaiveTime,
    next_day: bool,
    tz: Option<i64>,
) -> Result<TimelineValue, &'static str> {
    let mut instant = NaiveDateTime::new(date, time);
    if next_day {
        instant = instant
            .checked_add_signed(Duration::days(1))
            .ok_or(INVALID_LITERAL)?;
    }
    if let Some(offset) = tz {
        instant = instant
            .checked_sub_signed(Duration::minutes(offset))
            .ok_or(INVALID_LITERAL)?;
    }
    Ok(TimelineValue {
        instant,
        timezoned: tz.is_some(),
    })
}

fn parse_ymd(y: &str, m: &str, d: &str) -> Result<NaiveDate, &'static str> {
    let year: i32 = y.parse().map_err(|_| INVALID_LITERAL)?;
    let month: u32 = m.parse().map_err(|_| INVALID_LITERAL)?;
    let day: u32 = d.parse().map_err(|_| INVALID_LITERAL)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or(INVALID_LITERAL)
}

fn parse_date_time(s: &str) -> Result<TimelineValue, &'static str> {
    static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"^(-?\d{4,})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2}(?:\.\d+)?)(Z|[+-]\d{2}:\d{2})?$",
        )
        .unwrap()
    });
    let caps = DATE_TIME.captures(s).ok_or(INVALID_LITERAL)?;
    let date = parse_ymd(&caps[1], &caps[2], &caps[3])?;
    let (time, next_day) = parse_clock(&caps[4], &caps[5], &caps[6])?;
    let tz = parse_timezone(caps.get(7).map(|m| m.as_str()))?;
    timeline(date, time, next_day, tz)
}

fn parse_date(s: &str) -> Result<TimelineValue, &'static str> {
    static DATE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(-?\d{4,})-(\d{2})-(\d{2})(Z|[+-]\d{2}:\d{2})?$").unwrap()
    });
    let caps = DATE.captures(s).ok_or(INVALID_LITERAL)?;
    let date = parse_ymd(&caps[1], &caps[2], &caps[3])?;
    let tz = parse_timezone(caps.get(4).map(|m| m.as_str()))?;
    timeline(date, NaiveTime::MIN, false, tz)
}

fn parse_time(s: &str) -> Result<TimelineValue, &'static str> {
    static TIME: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(\d{2}):(\d{2}):(\d{2}(?:\.\d+)?)(Z|[+-]\d{2}:\d{2})?$").unwrap()
    });
    let caps = TIME.captures(s).ok_or(INVALID_LITERAL)?;
    let (time, next_day) = parse_clock(&caps[1], &caps[2], &caps[3])?;
    let tz = parse_timezone(caps.get(4).map(|m| m.as_str()))?;
    // times are compared on a fixed reference day
    let reference = NaiveDate::from_ymd_opt(1972, 12, 31).ok_or(INVALID_LITERAL)?;
    timeline(reference, time, next_day, tz)
}
