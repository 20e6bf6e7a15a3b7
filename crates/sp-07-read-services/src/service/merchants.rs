use shared_types::Address;
use sp_03_ledger_store::{LedgerRepository, Merchant, MerchantPlan, MerchantProfile};
use tracing::info;

use super::{generate_webhook_secret, ReadService};
use crate::domain::errors::{ReadError, ReadResult};
use crate::domain::views::{MerchantOverview, PlanQuery, RegisterMerchant};
use crate::ports::inbound::MerchantApi;

impl<S: LedgerRepository> MerchantApi for ReadService<S> {
    fn register_merchant(&self, request: RegisterMerchant) -> ReadResult<Merchant> {
        let now = self.now();
        let merchant = Merchant {
            wallet: request.wallet,
            company_name: request.company_name,
            email: request.email,
            logo_url: request.logo_url,
            webhook_url: request.webhook_url,
            webhook_secret: generate_webhook_secret(),
            created_at: now,
            updated_at: now,
        };
        Ok(self.store.insert_merchant_if_absent(merchant)?)
    }

    fn update_merchant(&self, wallet: &Address, profile: MerchantProfile) -> ReadResult<Merchant> {
        let mut merchant = self
            .store
            .get_merchant(wallet)?
            .ok_or(ReadError::MerchantNotFound(*wallet))?;

        if let Some(company_name) = profile.company_name {
            merchant.company_name = Some(company_name);
        }
        if let Some(email) = profile.email {
            merchant.email = Some(email);
        }
        if let Some(logo_url) = profile.logo_url {
            merchant.logo_url = Some(logo_url);
        }
        if let Some(webhook_url) = profile.webhook_url {
            merchant.webhook_url = Some(webhook_url);
        }
        merchant.updated_at = self.now();

        self.store.save_merchant(&merchant)?;
        Ok(merchant)
    }

    fn regenerate_webhook_secret(&self, wallet: &Address) -> ReadResult<String> {
        let mut merchant = self
            .store
            .get_merchant(wallet)?
            .ok_or(ReadError::MerchantNotFound(*wallet))?;
        merchant.webhook_secret = generate_webhook_secret();
        merchant.updated_at = self.now();
        self.store.save_merchant(&merchant)?;
        info!(merchant = %wallet, "[sp-07] Webhook secret rotated");
        Ok(merchant.webhook_secret)
    }

    fn get_merchant(&self, wallet: &Address) -> ReadResult<Option<MerchantOverview>> {
        let Some(merchant) = self.store.get_merchant(wallet)? else {
            return Ok(None);
        };
        let plans = self.merchant_plans(wallet)?;
        Ok(Some(MerchantOverview { merchant, plans }))
    }

    fn merchant_plans(&self, merchant: &Address) -> ReadResult<Vec<MerchantPlan>> {
        let mut plans = self.store.plans_by_merchant(merchant)?;
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    fn plan_detail(&self, plan: &Address) -> ReadResult<Option<MerchantPlan>> {
        Ok(self.store.get_plan(plan)?)
    }

    fn search_plans(&self, query: &PlanQuery) -> ReadResult<Vec<MerchantPlan>> {
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let mut plans: Vec<MerchantPlan> = self
            .store
            .all_plans()?
            .into_iter()
            .filter(|plan| plan.is_active)
            .filter(|plan| match &query.category {
                Some(category) => plan.category.as_deref() == Some(category.as_str()),
                None => true,
            })
            .filter(|plan| query.min_fee.map_or(true, |min| plan.fee_amount >= min))
            .filter(|plan| query.max_fee.map_or(true, |max| plan.fee_amount <= max))
            .filter(|plan| match &needle {
                Some(needle) => {
                    plan.plan_name.to_lowercase().contains(needle.as_str())
                        || plan
                            .description
                            .as_ref()
                            .is_some_and(|d| d.to_lowercase().contains(needle.as_str()))
                }
                None => true,
            })
            .collect();
        plans.sort_by(|a, b| b.total_subscribers.cmp(&a.total_subscribers));
        Ok(plans)
    }
}
