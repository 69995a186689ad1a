use crate::{
    args,
    handle::{class::ClassHandle, lua::Lua, table::TableHandle},
    runtime::error_code::ErrorCode,
};

const ACCOUNT: &str = r#"
Account = {}
Account.__index = Account
function Account.deposit(self, n) self.balance = self.balance + n return self.balance end
function Account.describe(self) return self.owner .. ': ' .. self.balance end
function Account.new(owner) return setmetatable({owner = owner, balance = 0}, Account) end
"#;

fn open_account(lua: &Lua) -> ClassHandle {
    assert!(lua.do_string(ACCOUNT).ok());
    let account = ClassHandle::from(&lua.eval("Account.new('ada')"));
    account.with_id("account")
}

#[test]
fn call_method_follows_the_index_chain() {
    let lua = Lua::new();
    let account = open_account(&lua);
    assert!(account.call_method("deposit", args![30]) == 30);
    assert!(account.call_method("deposit", args![12]) == 42);
    assert!(account.call_method("describe", args![]) == "ada: 42");
    assert_eq!(lua.stack_top(), 0);
}

#[test]
fn bound_methods_remember_their_receiver() {
    let lua = Lua::new();
    let account = open_account(&lua);
    let deposit = account.bound_method("deposit");
    assert!(!deposit.is_nil());
    assert_eq!(deposit.id(), "account:deposit");
    assert!(deposit.call(args![5]) == 5);
    assert!(deposit.call(args![5]) == 10);
    let fields = TableHandle::from(account.as_object().clone());
    assert!(fields.get_field("balance") == 10);
}

#[test]
fn missing_methods() {
    let lua = Lua::new();
    let account = open_account(&lua);
    let bound = account.bound_method("withdraw");
    assert!(bound.is_nil());
    assert_eq!(bound.type_name(), "nil");

    let result = account.call_method("withdraw", args![1]);
    assert_eq!(result.error_code(), ErrorCode::RuntimeError);
    assert_eq!(
        result.error_message(),
        "Function call account:withdraw(): attempt to call a nil value"
    );
}

#[test]
fn unconnected_classes() {
    let class = ClassHandle::default();
    assert!(class.bound_method("m").is_nil());
    assert_eq!(
        class.call_method("m", args![]).error_code(),
        ErrorCode::NoConnection
    );
}
