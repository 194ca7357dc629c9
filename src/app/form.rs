use anyhow::{anyhow, bail, Result};
use rust_decimal::Decimal;

use crate::store::Account;

/// Form fields mirroring the account table columns. The balance field
/// doubles as the amount entry for deposits and withdrawals.
#[derive(Default)]
pub struct Form {
    pub acc_no: String,
    pub name: String,
    pub acc_type: String,
    pub balance: String,
}

impl Form {
    fn parse_account(&self) -> Result<Account> {
        if [&self.acc_no, &self.name, &self.acc_type, &self.balance]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            bail!("Please fill all fields!");
        }
        let balance = self
            .balance
            .trim()
            .parse::<Decimal>()
            .map_err(|_| anyhow!("Balance must be a number!"))?;
        Ok(Account {
            acc_no: self.acc_no.trim().to_owned(),
            name: self.name.trim().to_owned(),
            acc_type: self.acc_type.trim().to_owned(),
            balance,
        })
    }

    fn parse_amount(&self) -> Result<Decimal> {
        self.balance
            .trim()
            .parse()
            .map_err(|_| anyhow!("Enter a valid amount!"))
    }
}

/// Idle: no selection, empty form. Selecting a row mirrors it into the
/// form; every mutating action ends with a reload that returns to Idle.
#[derive(Default)]
pub struct AppState {
    pub form: Form,
    pub accounts: Vec<Account>,
    pub selected: Option<usize>,
}

impl AppState {
    pub fn selected_account(&self) -> Option<&Account> {
        self.selected.and_then(|i| self.accounts.get(i))
    }

    pub fn clear_selection(&mut self) {
        self.form = Form::default();
        self.selected = None;
    }

    fn require_selection(&self, verb: &str) -> Result<&Account> {
        self.selected_account()
            .ok_or_else(|| anyhow!("Please select a record to {verb}!"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Update,
    Delete,
    Clear,
    Deposit,
    Withdraw,
    CheckBalance,
    Select(usize),
}

/// A store call the shell still has to execute. Produced by [`dispatch`],
/// which never touches the store itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Create(Account),
    Overwrite(Account),
    Remove(String),
    Deposit { acc_no: String, amount: Decimal },
    Withdraw { acc_no: String, amount: Decimal },
    QueryBalance(String),
}

/// Validates the action against the current state and turns it into an
/// effect. Validation failures abort here, before any store access.
pub fn dispatch(state: &mut AppState, action: Action) -> Result<Option<Effect>> {
    match action {
        Action::Clear => {
            state.clear_selection();
            Ok(None)
        }
        Action::Select(index) => {
            let Some(account) = state.accounts.get(index) else {
                return Ok(None);
            };
            state.form = Form {
                acc_no: account.acc_no.clone(),
                name: account.name.clone(),
                acc_type: account.acc_type.clone(),
                balance: account.balance.to_string(),
            };
            state.selected = Some(index);
            Ok(None)
        }
        Action::Add => Ok(Some(Effect::Create(state.form.parse_account()?))),
        Action::Update => {
            // The selection, not the editable account-number field, names
            // the row being overwritten.
            let target = state.require_selection("update")?.acc_no.clone();
            let mut account = state.form.parse_account()?;
            account.acc_no = target;
            Ok(Some(Effect::Overwrite(account)))
        }
        Action::Delete => {
            let target = state.require_selection("delete")?.acc_no.clone();
            Ok(Some(Effect::Remove(target)))
        }
        Action::Deposit => {
            let acc_no = state.require_selection("deposit into")?.acc_no.clone();
            let amount = state.form.parse_amount()?;
            Ok(Some(Effect::Deposit { acc_no, amount }))
        }
        Action::Withdraw => {
            let acc_no = state.require_selection("withdraw from")?.acc_no.clone();
            let amount = state.form.parse_amount()?;
            Ok(Some(Effect::Withdraw { acc_no, amount }))
        }
        Action::CheckBalance => {
            let acc_no = state.require_selection("check")?.acc_no.clone();
            Ok(Some(Effect::QueryBalance(acc_no)))
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn account(acc_no: &str, name: &str, balance: Decimal) -> Account {
        Account {
            acc_no: acc_no.to_owned(),
            name: name.to_owned(),
            acc_type: "Savings".to_owned(),
            balance,
        }
    }

    fn filled_form() -> Form {
        Form {
            acc_no: "100".to_owned(),
            name: "Alice".to_owned(),
            acc_type: "Savings".to_owned(),
            balance: "500.00".to_owned(),
        }
    }

    #[test]
    fn add_emits_create_effect_with_parsed_balance() {
        let mut state = AppState {
            form: filled_form(),
            ..Default::default()
        };

        let effect = dispatch(&mut state, Action::Add).unwrap();
        assert_eq!(
            effect,
            Some(Effect::Create(account("100", "Alice", dec!(500.00))))
        );
    }

    #[test]
    fn add_with_an_empty_field_is_rejected() {
        let mut state = AppState {
            form: Form {
                name: String::new(),
                ..filled_form()
            },
            ..Default::default()
        };

        let err = dispatch(&mut state, Action::Add).unwrap_err();
        assert_eq!(err.to_string(), "Please fill all fields!");
    }

    #[test]
    fn add_with_a_non_numeric_balance_is_rejected() {
        let mut state = AppState {
            form: Form {
                balance: "lots".to_owned(),
                ..filled_form()
            },
            ..Default::default()
        };

        let err = dispatch(&mut state, Action::Add).unwrap_err();
        assert_eq!(err.to_string(), "Balance must be a number!");
    }

    #[test]
    fn selecting_a_row_populates_the_form() {
        let mut state = AppState {
            accounts: vec![account("100", "Alice", dec!(500.00))],
            ..Default::default()
        };

        let effect = dispatch(&mut state, Action::Select(0)).unwrap();
        assert_eq!(effect, None);
        assert_eq!(state.selected, Some(0));
        assert_eq!(state.form.acc_no, "100");
        assert_eq!(state.form.name, "Alice");
        assert_eq!(state.form.balance, "500.00");
    }

    #[test]
    fn clear_returns_to_idle() {
        let mut state = AppState {
            form: filled_form(),
            accounts: vec![account("100", "Alice", dec!(500.00))],
            selected: Some(0),
        };

        dispatch(&mut state, Action::Clear).unwrap();
        assert_eq!(state.selected, None);
        assert!(state.form.acc_no.is_empty());
        assert!(state.form.balance.is_empty());
    }

    #[test]
    fn mutating_actions_require_a_selection() {
        let mut state = AppState {
            form: filled_form(),
            ..Default::default()
        };

        for action in [
            Action::Update,
            Action::Delete,
            Action::Deposit,
            Action::Withdraw,
            Action::CheckBalance,
        ] {
            let err = dispatch(&mut state, action).unwrap_err();
            assert!(
                err.to_string().starts_with("Please select a record"),
                "{action:?} should demand a selection"
            );
        }
    }

    #[test]
    fn deposit_pairs_the_selected_account_with_the_amount_field() {
        let mut state = AppState {
            accounts: vec![account("100", "Alice", dec!(500.00))],
            ..Default::default()
        };
        dispatch(&mut state, Action::Select(0)).unwrap();
        state.form.balance = "50".to_owned();

        let effect = dispatch(&mut state, Action::Deposit).unwrap();
        assert_eq!(
            effect,
            Some(Effect::Deposit {
                acc_no: "100".to_owned(),
                amount: dec!(50),
            })
        );
    }

    #[test]
    fn withdraw_with_a_non_numeric_amount_is_rejected() {
        let mut state = AppState {
            accounts: vec![account("100", "Alice", dec!(500.00))],
            ..Default::default()
        };
        dispatch(&mut state, Action::Select(0)).unwrap();
        state.form.balance = "a lot".to_owned();

        let err = dispatch(&mut state, Action::Withdraw).unwrap_err();
        assert_eq!(err.to_string(), "Enter a valid amount!");
    }

    #[test]
    fn update_targets_the_selected_account_number() {
        let mut state = AppState {
            accounts: vec![account("100", "Alice", dec!(500.00))],
            ..Default::default()
        };
        dispatch(&mut state, Action::Select(0)).unwrap();
        // Editing the account-number field must not redirect the update.
        state.form.acc_no = "999".to_owned();
        state.form.name = "Alice Smith".to_owned();

        let effect = dispatch(&mut state, Action::Update).unwrap();
        let Some(Effect::Overwrite(updated)) = effect else {
            panic!("expected an overwrite effect");
        };
        assert_eq!(updated.acc_no, "100");
        assert_eq!(updated.name, "Alice Smith");
    }
}
