use serde::{Deserialize, Serialize};

/// Format a raw token amount with `decimals` places, trailing zeros trimmed.
///
/// Integer-only: `token_amount_to_ui_string(1_500_000, 6) == "1.5"`.
pub fn token_amount_to_ui_string(amount: u64, decimals: u8) -> String {
    let mut s = real_number_string(amount, decimals);
    if decimals > 0 {
        s = s.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    s
}

/// Like [`token_amount_to_ui_string`] but keeps every decimal place.
pub fn real_number_string(amount: u64, decimals: u8) -> String {
    let decimals = decimals as usize;
    if decimals == 0 {
        return amount.to_string();
    }
    // pad so there is at least one integer digit
    let mut s = format!("{:01$}", amount, decimals + 1);
    s.insert(s.len() - decimals, '.');
    s
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    pub amount: String,
    pub decimals: u8,
    pub ui_amount_string: String,
}

impl UiTokenAmount {
    pub fn new(amount: u64, decimals: u8) -> Self {
        Self {
            amount: amount.to_string(),
            decimals,
            ui_amount_string: token_amount_to_ui_string(amount, decimals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_decimals() {
        assert_eq!(token_amount_to_ui_string(1_500_000, 6), "1.5");
        assert_eq!(token_amount_to_ui_string(1, 9), "0.000000001");
        assert_eq!(token_amount_to_ui_string(100_000_000_000, 9), "100");
        assert_eq!(token_amount_to_ui_string(0, 9), "0");
        assert_eq!(token_amount_to_ui_string(42, 0), "42");
    }

    #[test]
    fn untrimmed_form() {
        assert_eq!(real_number_string(1_500_000, 6), "1.500000");
        assert_eq!(real_number_string(5, 3), "0.005");
    }

    #[test]
    fn max_supply_is_exact() {
        assert_eq!(
            token_amount_to_ui_string(u64::MAX, 9),
            "18446744073.709551615"
        );
        assert_eq!(
            token_amount_to_ui_string(u64::MAX, 30),
            "0.000000000018446744073709551615"
        );
    }

    #[test]
    fn ui_amount_json() {
        let json = serde_json::to_value(UiTokenAmount::new(2_500, 2)).unwrap();
        assert_eq!(json["amount"], "2500");
        assert_eq!(json["uiAmountString"], "25");
    }
}
