use crate::args::AddArgs;
use crate::commands::Out;
use crate::inventory::Inventory;
use crate::model::{Entry, Record};
use crate::Result;

/// Logs a new record. The record as written, including its timestamp, is returned as the
/// structured output.
pub async fn add(inventory: &Inventory, args: AddArgs) -> Result<Out<Record>> {
    let entry = Entry::new(args.name, args.amount, args.category, args.note);
    let record = inventory.append(entry).await?;
    Ok(Out::new(
        format!(
            "Logged '{}' ({} {}) at {}",
            record.name(),
            record.category(),
            record.amount(),
            record.timestamp()
        ),
        record,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Mode;
    use crate::model::Category;
    use crate::test::TestEnv;
    use crate::ErrorType;

    fn args(name: &str, amount: &str) -> AddArgs {
        AddArgs {
            name: name.into(),
            amount: amount.parse().unwrap(),
            category: Category::Inbound,
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn test_add() {
        let env = TestEnv::new().await;
        let inventory = Inventory::open(&env.config(), Mode::Testing).await.unwrap();
        let out = add(&inventory, args("Widget A", "10")).await.unwrap();
        assert!(out.message().starts_with("Logged 'Widget A' (입고 10) at "));
        assert_eq!(out.structure().unwrap().name(), "Widget A");
        assert_eq!(env.get_state().worksheets[0].rows.len(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let env = TestEnv::new().await;
        let inventory = Inventory::open(&env.config(), Mode::Testing).await.unwrap();
        let err = add(&inventory, args("", "10")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        let err = add(&inventory, args("Widget A", "-3")).await.unwrap_err();
        assert_eq!(err.to_string(), "amount must not be negative");
        assert!(env.get_state().worksheets[0].rows.is_empty());
    }
}
