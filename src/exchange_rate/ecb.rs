//! Downloads and parses the European Central Bank's historical reference rates.
//!
//! The feed lists, for each working day, how many units of each currency one
//! euro buys. These are converted into rates against GBP before storing.

use std::collections::HashMap;

use quick_xml::{Reader, events::Event};
use rusqlite::{Connection, OptionalExtension};
use time::{Date, PrimitiveDateTime, macros::format_description};

use crate::{
    Error,
    exchange_rate::{get_foreign_transaction_currencies, upsert_exchange_rate},
    money::REFERENCE_CURRENCY,
};

/// The rates published for one day, as units of currency per euro.
#[derive(Debug, Clone, PartialEq)]
pub struct EcbDay {
    pub date: Date,
    pub rates: HashMap<String, f64>,
}

/// What [store_ecb_rates] wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RateUpdateSummary {
    /// The number of dates rates were stored for.
    pub days: usize,
    /// The number of rates stored across all dates.
    pub rates: usize,
}

/// Download the ECB feed at `url`.
pub async fn fetch_ecb_xml(client: &reqwest::Client, url: &str) -> Result<String, Error> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|error| Error::ExchangeRateFetchError(error.to_string()))?;

    response
        .text()
        .await
        .map_err(|error| Error::ExchangeRateFetchError(error.to_string()))
}

/// Parse the `<Cube time="...">` entries of an ECB feed.
pub fn parse_ecb_xml(xml: &str) -> Result<Vec<EcbDay>, Error> {
    let date_format = format_description!("[year]-[month]-[day]");
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut days: Vec<EcbDay> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|error| Error::ExchangeRateParseError(error.to_string()))?;

        let cube = match event {
            Event::Start(element) | Event::Empty(element) => element,
            Event::Eof => break,
            _ => continue,
        };

        if cube.local_name().as_ref() != b"Cube" {
            continue;
        }

        let mut time = None;
        let mut currency = None;
        let mut rate = None;

        for attribute in cube.attributes() {
            let attribute =
                attribute.map_err(|error| Error::ExchangeRateParseError(error.to_string()))?;
            let value = String::from_utf8_lossy(&attribute.value).into_owned();

            match attribute.key.as_ref() {
                b"time" => time = Some(value),
                b"currency" => currency = Some(value),
                b"rate" => rate = Some(value),
                _ => {}
            }
        }

        if let Some(time) = time {
            let date = Date::parse(&time, &date_format).map_err(|error| {
                Error::ExchangeRateParseError(format!("invalid date \"{time}\": {error}"))
            })?;

            days.push(EcbDay {
                date,
                rates: HashMap::new(),
            });
        } else if let (Some(currency), Some(rate)) = (currency, rate) {
            let rate: f64 = rate.parse().map_err(|_| {
                Error::ExchangeRateParseError(format!("invalid rate \"{rate}\" for {currency}"))
            })?;

            match days.last_mut() {
                Some(day) => {
                    day.rates.insert(currency, rate);
                }
                None => {
                    return Err(Error::ExchangeRateParseError(format!(
                        "rate for {currency} appears before any date"
                    )));
                }
            }
        }
    }

    Ok(days)
}

/// Convert a rate against the euro into a rate against GBP.
///
/// `gbp_eur` is how many pounds one euro buys.
pub fn calculate_gbp_rate(currency: &str, currency_eur: f64, gbp_eur: f64) -> f64 {
    match currency {
        REFERENCE_CURRENCY => 1.0,
        "EUR" => 1.0 / gbp_eur,
        _ => currency_eur / gbp_eur,
    }
}

/// Store the rates of the currencies used by transactions for the days that
/// are on or after the first transaction and after the last stored rate.
pub fn store_ecb_rates(days: &[EcbDay], connection: &Connection) -> Result<RateUpdateSummary, Error> {
    let currencies = get_foreign_transaction_currencies(connection)?;
    let mut summary = RateUpdateSummary::default();

    if currencies.is_empty() {
        return Ok(summary);
    }

    let first_transaction: Option<PrimitiveDateTime> = connection
        .query_row("SELECT MIN(date) FROM \"transaction\"", [], |row| {
            row.get::<_, Option<PrimitiveDateTime>>(0)
        })
        .optional()?
        .flatten();
    let last_stored: Option<Date> = connection
        .query_row("SELECT MAX(date) FROM exchange_rate", [], |row| {
            row.get::<_, Option<Date>>(0)
        })
        .optional()?
        .flatten();

    for day in days {
        if first_transaction.is_some_and(|first| day.date < first.date())
            || last_stored.is_some_and(|last| day.date <= last)
        {
            continue;
        }

        let Some(&gbp_eur) = day.rates.get(REFERENCE_CURRENCY) else {
            tracing::warn!("ECB rates for {} have no GBP rate, skipping", day.date);
            continue;
        };

        let mut stored_any = false;

        for currency in &currencies {
            let currency_eur = match currency.as_ref() {
                "EUR" => 1.0,
                code => match day.rates.get(code) {
                    Some(&rate) => rate,
                    None => continue,
                },
            };

            let rate = calculate_gbp_rate(currency.as_ref(), currency_eur, gbp_eur);
            upsert_exchange_rate(currency, rate, day.date, connection)?;
            summary.rates += 1;
            stored_any = true;
        }

        if stored_any {
            summary.days += 1;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        account::{NewAccount, create_account},
        db::initialize,
        exchange_rate::{
            calculate_gbp_rate, get_rate_for_date, parse_ecb_xml, store_ecb_rates,
        },
        money::CurrencyCode,
        name::Name,
        transaction::{NewTransaction, create_transaction},
    };

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gesmes:Envelope xmlns:gesmes="http://www.gesmes.org/xml/2002-08-01" xmlns="http://www.ecb.int/vocabulary/2002-08-01/eurofxref">
    <gesmes:subject>Reference rates</gesmes:subject>
    <Cube>
        <Cube time="2025-01-03">
            <Cube currency="USD" rate="1.0299"/>
            <Cube currency="GBP" rate="0.8300"/>
        </Cube>
        <Cube time="2025-01-02">
            <Cube currency="USD" rate="1.0321"/>
            <Cube currency="GBP" rate="0.8290"/>
        </Cube>
        <Cube time="2024-12-31">
            <Cube currency="USD" rate="1.0389"/>
            <Cube currency="GBP" rate="0.8292"/>
        </Cube>
    </Cube>
</gesmes:Envelope>"#;

    #[test]
    fn parses_days_and_rates() {
        let days = parse_ecb_xml(FEED).unwrap();

        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, date!(2025-01-03));
        assert_eq!(days[0].rates["USD"], 1.0299);
        assert_eq!(days[2].rates["GBP"], 0.8292);
    }

    #[test]
    fn rejects_malformed_rate() {
        let result = parse_ecb_xml(r#"<Cube><Cube time="2025-01-03"><Cube currency="USD" rate="abc"/></Cube></Cube>"#);

        assert!(result.is_err());
    }

    #[test]
    fn converts_euro_rates_to_pounds() {
        assert_eq!(calculate_gbp_rate("GBP", 0.83, 0.83), 1.0);
        assert!((calculate_gbp_rate("EUR", 1.0, 0.8) - 1.25).abs() < 1e-9);
        assert!((calculate_gbp_rate("USD", 1.04, 0.8) - 1.3).abs() < 1e-9);
    }

    #[test]
    fn stores_rates_from_first_transaction_for_used_currencies() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let account = create_account(
            &NewAccount {
                name: Name::new_unchecked("Dollars"),
                kind: None,
                currency: CurrencyCode::new("USD").unwrap(),
                initial_balance: 0.0,
                is_active: true,
            },
            &connection,
        )
        .unwrap();
        create_transaction(
            NewTransaction::new(account.id, datetime!(2025-01-02 10:00), -5.0),
            &connection,
        )
        .unwrap();
        let days = parse_ecb_xml(FEED).unwrap();

        let summary = store_ecb_rates(&days, &connection).unwrap();

        assert_eq!(summary.days, 2);
        assert_eq!(summary.rates, 2);
        let usd = CurrencyCode::new("USD").unwrap();
        let rate = get_rate_for_date(&usd, date!(2025-01-02), &connection)
            .unwrap()
            .unwrap();
        assert!((rate - 1.244994).abs() < 1e-6);
        assert_eq!(
            get_rate_for_date(&usd, date!(2024-12-31), &connection).unwrap(),
            None
        );

        // Already stored days are not fetched again.
        let summary = store_ecb_rates(&days, &connection).unwrap();
        assert_eq!(summary.rates, 0);
    }
}
