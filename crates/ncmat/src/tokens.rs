//! Library of token-level parser functions
//!
//! NCMAT lines are already split into whitespace-separated tokens before
//! these run, so every helper here consumes one complete token.

// nom parser combinators
use nom::character::complete::digit1;
use nom::combinator::all_consuming;
use nom::number::complete::double;

/// Decode a plain number token, rejecting NaN and infinities
pub(crate) fn number(token: &str) -> Result<f64, String> {
    let (rest, value) =
        double::<&str, ()>(token).map_err(|_| format!("could not decode number \"{token}\""))?;
    if !rest.is_empty() {
        return Err(format!("could not decode number \"{token}\""));
    }
    if !value.is_finite() {
        return Err(format!("\"{token}\" is NaN or an infinite number"));
    }
    Ok(value)
}

/// Decode a number token which may be a literal fraction like `1/3`
pub(crate) fn number_with_fractions(token: &str, allow_fractions: bool) -> Result<f64, String> {
    let Some(slash) = token.find('/') else {
        return number(token);
    };
    if !allow_fractions {
        return Err(format!(
            "specification with fractions not supported in NCMAT v1 files \
             (offending parameter is \"{token}\")"
        ));
    }
    let (numerator, denominator) = token.split_at(slash);
    let denominator = &denominator[1..];
    if denominator.contains('/') {
        return Err(format!(
            "multiple fractions in numbers are not supported so could not parse \"{token}\""
        ));
    }
    if numerator.is_empty() || denominator.is_empty() {
        return Err(format!(
            "empty denominator or numerator so could not parse \"{token}\""
        ));
    }
    let a = number(numerator)?;
    let b = number(denominator)?;
    if b == 0.0 {
        return Err(format!("division by zero attempted in \"{token}\""));
    }
    Ok(a / b)
}

/// Decode a vector entry with the run-length shorthand `<value>r<count>`
///
/// Returns the value and how many times it repeats (1 for a plain number).
pub(crate) fn repeated_number(token: &str) -> Result<(f64, usize), String> {
    let Some(marker) = token.find('r') else {
        return Ok((number(token)?, 1));
    };
    let (value_str, count_str) = token.split_at(marker);
    let value = number(value_str)?;
    let count_str = &count_str[1..];
    let count: usize = all_consuming(digit1::<&str, ()>)(count_str)
        .map_err(|_| format!("could not decode repeat count in \"{token}\""))
        .and_then(|(_, digits)| {
            digits
                .parse()
                .map_err(|_| format!("could not decode repeat count in \"{token}\""))
        })?;
    if count < 2 {
        return Err("repeated entry count parameter must be >= 2".to_string());
    }
    Ok((value, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_numbers() {
        assert_eq!(number("2.5").unwrap(), 2.5);
        assert_eq!(number("-1e-3").unwrap(), -1e-3);
        assert!(number("nan").is_err());
        assert!(number("inf").is_err());
        assert!(number("2.5x").is_err());
    }

    #[test]
    fn fractions() {
        assert_eq!(number_with_fractions("1/4", true).unwrap(), 0.25);
        assert!(number_with_fractions("1/4", false).is_err());
        assert!(number_with_fractions("1/0", true).is_err());
        assert!(number_with_fractions("1/2/3", true).is_err());
        assert!(number_with_fractions("/3", true).is_err());
    }

    #[test]
    fn repeats() {
        assert_eq!(repeated_number("0.5r3").unwrap(), (0.5, 3));
        assert_eq!(repeated_number("0.5").unwrap(), (0.5, 1));
        assert!(repeated_number("0.5r1").is_err());
        assert!(repeated_number("0.5rx").is_err());
    }
}
