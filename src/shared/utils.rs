use bigdecimal::BigDecimal;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_conn(database_url: &str, max_connections: u32) -> Result<DbPool, diesel::r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(max_connections).build(manager)
}

/// Lossy conversion for reporting payloads; stored amounts stay decimal.
pub fn bd_to_f64(val: &BigDecimal) -> f64 {
    val.to_string().parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn bd_to_f64_parses_decimal_values() {
        assert_eq!(bd_to_f64(&BigDecimal::from(1500)), 1500.0);
        assert_eq!(bd_to_f64(&BigDecimal::from_str("12.50").unwrap()), 12.5);
    }
}
