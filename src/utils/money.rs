//! Prices are decimal rupees with at most two fractional digits.

use bigdecimal::BigDecimal;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Negative,
    TooPrecise,
}

impl Error {
    pub fn message(&self) -> &'static str {
        match self {
            Error::Negative => "Price cannot be negative",
            Error::TooPrecise => "Price cannot have more than two decimal places",
        }
    }
}

pub fn parse_price(price: &BigDecimal) -> Result<BigDecimal, Error> {
    if *price < BigDecimal::from(0) {
        return Err(Error::Negative);
    }

    let rounded = price.with_scale(2);
    if rounded != *price {
        return Err(Error::TooPrecise);
    }

    Ok(rounded)
}

pub fn line_total(price: &BigDecimal, quantity: i32) -> BigDecimal {
    price * &BigDecimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn whole_and_two_digit_prices_are_accepted() {
        assert_eq!(
            parse_price(&BigDecimal::from(180)).unwrap(),
            BigDecimal::from_str("180.00").unwrap()
        );
        assert_eq!(
            parse_price(&BigDecimal::from_str("99.5").unwrap()).unwrap(),
            BigDecimal::from_str("99.50").unwrap()
        );
    }

    #[test]
    fn negative_prices_are_rejected() {
        assert_eq!(
            parse_price(&BigDecimal::from(-1)).unwrap_err(),
            Error::Negative
        );
    }

    #[test]
    fn sub_paisa_prices_are_rejected() {
        assert_eq!(
            parse_price(&BigDecimal::from_str("10.005").unwrap()).unwrap_err(),
            Error::TooPrecise
        );
    }

    #[test]
    fn line_total_multiplies_by_quantity() {
        assert_eq!(
            line_total(&BigDecimal::from(180), 2),
            BigDecimal::from(360)
        );
    }
}
