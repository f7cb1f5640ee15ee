use crate::{config::Thresholds, ledger::Account};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Status,
    Address,
    Stake,
    Balance,
    #[default]
    Service,
    Gateway,
}

impl SortField {
    /// Unknown names fall back to `service`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "status" => Self::Status,
            "address" => Self::Address,
            "stake" => Self::Stake,
            "balance" => Self::Balance,
            "gateway" => Self::Gateway,
            _ => Self::Service,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Address => "address",
            Self::Stake => "stake",
            Self::Balance => "balance",
            Self::Service => "service",
            Self::Gateway => "gateway",
        }
    }

    /// Natural ordering for the field: text ascending, amounts highest first.
    /// Ties fall back to the address so reversing the direction reverses the whole list.
    fn compare(self, a: &Account, b: &Account) -> Ordering {
        let ordering = match self {
            Self::Address => a.address.cmp(&b.address),
            Self::Service => a.service_id.cmp(&b.service_id),
            Self::Status | Self::Stake => b.stake.cmp(&a.stake),
            Self::Balance => b.balance.total_cmp(&a.balance),
            Self::Gateway => a.gateways.cmp(&b.gateways),
        };
        ordering.then_with(|| a.address.cmp(&b.address))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Warning,
    Danger,
}

impl Health {
    pub fn classify(stake: u64, thresholds: &Thresholds) -> Self {
        if stake >= thresholds.warning {
            Self::Healthy
        } else if stake >= thresholds.danger {
            Self::Warning
        } else {
            Self::Danger
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// The fetched accounts in display order, plus the sort that produced it.
#[derive(Debug, Clone, Default)]
pub struct AccountList {
    items: Vec<Account>,
    sort: SortSpec,
}

impl AccountList {
    pub fn items(&self) -> &[Account] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Account> {
        self.items.get(index)
    }

    pub fn find(&self, address: &str) -> Option<&Account> {
        self.items.iter().find(|account| account.address == address)
    }

    pub fn sort_spec(&self) -> SortSpec {
        self.sort
    }

    /// Replace the whole collection and re-apply the active sort.
    pub fn replace(&mut self, accounts: Vec<Account>) {
        self.items = accounts;
        self.sort();
    }

    /// Same field toggles direction; a new field starts ascending.
    pub fn set_sort_by(&mut self, field: SortField) {
        if self.sort.field == field {
            self.sort.descending = !self.sort.descending;
        } else {
            self.sort = SortSpec {
                field,
                descending: false,
            };
        }
        self.sort();
    }

    pub fn set_direction(&mut self, descending: bool) {
        self.sort.descending = descending;
        self.sort();
    }

    pub fn sort(&mut self) {
        sort_accounts(&mut self.items, self.sort);
    }

    pub fn search(&self, term: &str) -> Vec<usize> {
        search_accounts(&self.items, term)
    }
}

/// Stable sort; `descending` flips the field's natural ordering.
pub fn sort_accounts(accounts: &mut [Account], spec: SortSpec) {
    accounts.sort_by(|a, b| {
        let ordering = spec.field.compare(a, b);
        if spec.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Indices of accounts whose address or service contains `term`, ignoring case.
pub fn search_accounts(accounts: &[Account], term: &str) -> Vec<usize> {
    if term.is_empty() {
        return Vec::new();
    }
    let needle = term.to_lowercase();
    accounts
        .iter()
        .enumerate()
        .filter(|(_, account)| {
            account.address.to_lowercase().contains(&needle)
                || account.service_id.to_lowercase().contains(&needle)
        })
        .map(|(index, _)| index)
        .collect()
}
