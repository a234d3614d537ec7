use std::fmt::Write;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, TimeZone, Timelike};

use crate::raw_symbol_token::RawSymbolToken;
use crate::result::IonResult;
use crate::types::timestamp::Precision;
use crate::types::{Decimal, Int, IonType, Timestamp};

/// Formats individual Ion scalar values as Ion text. Whitespace management and container
/// delimiters belong to the writer driving this formatter.
pub(crate) struct IonValueFormatter<'a, W: Write> {
    pub(crate) output: &'a mut W,
}

impl<'a, W: Write> IonValueFormatter<'a, W> {
    pub fn format_null(&mut self, ion_type: IonType) -> IonResult<()> {
        use IonType::*;
        let null_text = match ion_type {
            Null => "null",
            Bool => "null.bool",
            Int => "null.int",
            Float => "null.float",
            Decimal => "null.decimal",
            Timestamp => "null.timestamp",
            Symbol => "null.symbol",
            String => "null.string",
            Clob => "null.clob",
            Blob => "null.blob",
            List => "null.list",
            SExp => "null.sexp",
            Struct => "null.struct",
        };
        write!(self.output, "{null_text}")?;
        Ok(())
    }

    pub fn format_bool(&mut self, value: bool) -> IonResult<()> {
        let bool_text = match value {
            true => "true",
            false => "false",
        };
        write!(self.output, "{bool_text}")?;
        Ok(())
    }

    pub fn format_integer(&mut self, value: &Int) -> IonResult<()> {
        write!(self.output, "{value}")?;
        Ok(())
    }

    pub fn format_float(&mut self, value: f64) -> IonResult<()> {
        if value.is_nan() {
            write!(self.output, "nan")?;
            return Ok(());
        }

        if value.is_infinite() {
            if value.is_sign_positive() {
                write!(self.output, "+inf")?;
            } else {
                write!(self.output, "-inf")?;
            }
            return Ok(());
        }

        // The {:e} formatter writes floats in scientific notation, which is always a legal
        // Ion float. It drops the sign of -0.0, however.
        // See: https://github.com/rust-lang/rust/issues/20596
        if value == 0.0f64 && value.is_sign_negative() {
            write!(self.output, "-0e0")?;
            return Ok(());
        }

        write!(self.output, "{value:e}")?;
        Ok(())
    }

    pub fn format_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        write!(self.output, "{value}")?;
        Ok(())
    }

    pub fn format_timestamp(&mut self, value: &Timestamp) -> IonResult<()> {
        let (offset_minutes, datetime) = match value.offset {
            Some(offset) => {
                // Apply the offset so the printed fields are in local time
                let datetime: DateTime<FixedOffset> =
                    offset.from_utc_datetime(&value.date_time);
                (Some(offset.local_minus_utc() / 60), datetime)
            }
            None => {
                // An unknown offset makes no assertion about where the timestamp was
                // recorded; its fields are rendered in UTC.
                let datetime: NaiveDateTime = value.date_time;
                let datetime: DateTime<FixedOffset> = FixedOffset::east_opt(0)
                    .expect("zero offset is always valid")
                    .from_utc_datetime(&datetime);
                (None, datetime)
            }
        };

        write!(self.output, "{:0>4}", datetime.year())?;
        //                    ^-- 0-padded, right aligned, 4-digit year
        if value.precision == Precision::Year {
            write!(self.output, "T")?;
            return Ok(());
        }

        write!(self.output, "-{:0>2}", datetime.month())?;
        if value.precision == Precision::Month {
            write!(self.output, "T")?;
            return Ok(());
        }

        write!(self.output, "-{:0>2}", datetime.day())?;
        if value.precision == Precision::Day {
            return Ok(());
        }

        write!(
            self.output,
            "T{:0>2}:{:0>2}",
            datetime.hour(),
            datetime.minute()
        )?;
        if value.precision == Precision::HourAndMinute {
            self.format_offset(offset_minutes)?;
            return Ok(());
        }

        write!(self.output, ":{:0>2}", datetime.second())?;
        value.format_fractional_seconds(&mut *self.output)?;
        self.format_offset(offset_minutes)?;
        Ok(())
    }

    fn format_offset(&mut self, offset_minutes: Option<i32>) -> IonResult<()> {
        let offset_minutes = match offset_minutes {
            Some(minutes) => minutes,
            None => {
                // Unknown offset
                write!(self.output, "-00:00")?;
                return Ok(());
            }
        };
        const MINUTES_PER_HOUR: i32 = 60;
        let sign = if offset_minutes >= 0 { "+" } else { "-" };
        let offset_minutes = offset_minutes.abs();
        let hours = offset_minutes / MINUTES_PER_HOUR;
        let minutes = offset_minutes % MINUTES_PER_HOUR;
        write!(self.output, "{sign}{hours:0>2}:{minutes:0>2}")?;
        Ok(())
    }

    pub fn format_symbol_token(&mut self, token: &RawSymbolToken) -> IonResult<()> {
        match token {
            RawSymbolToken::SymbolId(sid) => write!(self.output, "${sid}")?,
            RawSymbolToken::Text(text) => self.format_symbol(text)?,
        };
        Ok(())
    }

    pub fn format_symbol<A: AsRef<str>>(&mut self, value: A) -> IonResult<()> {
        let text = value.as_ref();
        if Self::symbol_needs_quoting(text) {
            write!(self.output, "'")?;
            self.format_escaped_text_body(text, '\'')?;
            write!(self.output, "'")?;
        } else {
            write!(self.output, "{text}")?;
        }
        Ok(())
    }

    pub fn format_string<A: AsRef<str>>(&mut self, value: A) -> IonResult<()> {
        write!(self.output, "\"")?;
        self.format_escaped_text_body(value.as_ref(), '"')?;
        write!(self.output, "\"")?;
        Ok(())
    }

    pub fn format_clob<A: AsRef<[u8]>>(&mut self, value: A) -> IonResult<()> {
        write!(self.output, "{{{{\"")?;
        for byte in value.as_ref() {
            match *byte {
                b'"' => write!(self.output, "\\\"")?,
                b'\\' => write!(self.output, "\\\\")?,
                b'\t' => write!(self.output, "\\t")?,
                b'\n' => write!(self.output, "\\n")?,
                b'\r' => write!(self.output, "\\r")?,
                // Printable ASCII passes through; everything else is hex-escaped
                printable @ 0x20..=0x7e => write!(self.output, "{}", printable as char)?,
                other => write!(self.output, "\\x{other:02x}")?,
            }
        }
        write!(self.output, "\"}}}}")?;
        Ok(())
    }

    pub fn format_blob<A: AsRef<[u8]>>(&mut self, value: A) -> IonResult<()> {
        write!(self.output, "{{{{{}}}}}", base64::encode(value.as_ref()))?;
        Ok(())
    }

    // Writes the body of a quoted string or symbol with all required escapes applied.
    // `quote` is the delimiter of the current context, which must itself be escaped.
    fn format_escaped_text_body(&mut self, value: &str, quote: char) -> IonResult<()> {
        for c in value.chars() {
            match c {
                '\\' => write!(self.output, "\\\\")?,
                '\t' => write!(self.output, "\\t")?,
                '\n' => write!(self.output, "\\n")?,
                '\r' => write!(self.output, "\\r")?,
                c if c == quote => write!(self.output, "\\{c}")?,
                // Other control characters use \uXXXX escapes
                c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                    write!(self.output, "\\u{:04x}", c as u32)?
                }
                c => write!(self.output, "{c}")?,
            }
        }
        Ok(())
    }

    // A symbol can be written unquoted if it is a non-empty identifier that is not a
    // keyword.
    fn symbol_needs_quoting(text: &str) -> bool {
        if matches!(text, "" | "true" | "false" | "null" | "nan") {
            return true;
        }
        let mut chars = text.chars();
        let first = chars.next().expect("text is non-empty");
        if !(first == '$' || first == '_' || first.is_ascii_alphabetic()) {
            return true;
        }
        if chars.any(|c| !(c == '$' || c == '_' || c.is_ascii_alphanumeric())) {
            return true;
        }
        // `$123` is a symbol ID reference, not an identifier
        text.starts_with('$') && text[1..].bytes().all(|b| b.is_ascii_digit())
    }
}
