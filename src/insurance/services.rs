use tracing::{info, warn};

use super::{
    dto::{
        ClaimQuery, ClaimResponse, CreateClaimRequest, CreatePolicyRequest, PolicyQuery,
        PolicyResponse, ProcessClaimRequest, UpdateClaimRequest, UpdatePolicyRequest,
    },
    parser::{ClaimParser, PolicyParser},
    repo_types::{ClaimPatch, ClaimStatus, InsurancePolicy},
};
use crate::{
    error::{AppError, AppResult},
    manager::{require_related, ResourceManager},
    parser::{encode_blob, now, Parser},
    store::{EntityKind, Filter, UnitOfWork},
    users::repo_types::User,
};

pub struct InsuranceManager<'a> {
    uow: &'a UnitOfWork,
    policies: ResourceManager<PolicyParser>,
    claims: ResourceManager<ClaimParser>,
}

impl<'a> InsuranceManager<'a> {
    pub fn new(uow: &'a UnitOfWork) -> AppResult<Self> {
        Ok(Self {
            uow,
            policies: ResourceManager::open(uow)?,
            claims: ResourceManager::open(uow)?,
        })
    }

    pub async fn create_policy(&self, req: CreatePolicyRequest) -> AppResult<PolicyResponse> {
        require_related::<User>(self.uow, &req.patient_id).await?;
        self.policies.create(req).await
    }

    pub async fn get_policy(&self, id: &str) -> AppResult<PolicyResponse> {
        self.policies.get(id).await
    }

    pub async fn list_policies(&self, query: PolicyQuery) -> AppResult<Vec<PolicyResponse>> {
        let filter = Filter::new()
            .eq_opt("patient_id", query.patient_id)
            .eq_opt("status", query.status.map(|s| s.as_str()));
        self.policies.list(&filter).await
    }

    pub async fn update_policy(
        &self,
        id: &str,
        req: UpdatePolicyRequest,
    ) -> AppResult<PolicyResponse> {
        self.policies.update(id, req).await
    }

    /// Refuses while claims still reference the policy.
    pub async fn delete_policy(&self, id: &str) -> AppResult<bool> {
        let claims = self
            .uow
            .get_store(EntityKind::InsuranceClaim)?
            .count(&Filter::new().eq("policy_id", id))
            .await?;
        if claims > 0 {
            warn!(policy_id = %id, claims, "policy still has claims");
            return Err(AppError::ConstraintViolation(format!(
                "Insurance policy {id} still has {claims} claims"
            )));
        }
        self.policies.delete(id).await
    }

    pub async fn create_claim(&self, mut req: CreateClaimRequest) -> AppResult<ClaimResponse> {
        let policy = require_related::<InsurancePolicy>(self.uow, &req.policy_id).await?;
        req.patient_id = policy.patient_id;
        self.claims.create(req).await
    }

    pub async fn get_claim(&self, id: &str) -> AppResult<ClaimResponse> {
        self.claims.get(id).await
    }

    pub async fn list_claims(&self, query: ClaimQuery) -> AppResult<Vec<ClaimResponse>> {
        let filter = Filter::new()
            .eq_opt("policy_id", query.policy_id)
            .eq_opt("patient_id", query.patient_id)
            .eq_opt("status", query.status.map(|s| s.as_str()));
        self.claims.list(&filter).await
    }

    pub async fn update_claim(&self, id: &str, req: UpdateClaimRequest) -> AppResult<ClaimResponse> {
        self.claims.update(id, req).await
    }

    pub async fn delete_claim(&self, id: &str) -> AppResult<bool> {
        self.claims.delete(id).await
    }

    /// A claim is processed exactly once.
    pub async fn process_claim(
        &self,
        id: &str,
        req: ProcessClaimRequest,
    ) -> AppResult<ClaimResponse> {
        let claim = self.claims.fetch(id).await?;
        if claim.status == ClaimStatus::Processed {
            warn!(claim_id = %id, "claim already processed");
            return Err(AppError::Validation("Claim is already processed".into()));
        }
        let processing = encode_blob("processing", req.processing)?
            .or_else(|| Some("{}".to_string()));
        let processed = self
            .claims
            .patch(
                id,
                ClaimPatch {
                    status: Some(ClaimStatus::Processed),
                    processing,
                    processed_at: Some(now()),
                    ..Default::default()
                },
            )
            .await?;
        info!(claim_id = %id, policy_id = %processed.policy_id, "claim processed");
        Ok(ClaimParser::to_response(processed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::StoreRegistry,
        users::{repo_types::Role, services::seed_user},
    };
    use serde_json::json;

    fn policy(patient_id: &str) -> CreatePolicyRequest {
        CreatePolicyRequest {
            patient_id: patient_id.into(),
            provider: "Acme Health".into(),
            policy_number: "AC-1001".into(),
            sum_insured: 500_000,
            premium: 1200.0,
            coverage: Some(json!({"dental": true})),
            valid_till: None,
            status: Default::default(),
        }
    }

    fn claim(policy_id: &str, amount: f64) -> CreateClaimRequest {
        CreateClaimRequest {
            policy_id: policy_id.into(),
            patient_id: String::new(),
            amount,
            description: Some("x-ray".into()),
        }
    }

    #[tokio::test]
    async fn policy_requires_existing_patient() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let mgr = InsuranceManager::new(&uow).unwrap();
        assert!(matches!(
            mgr.create_policy(policy("ghost")).await,
            Err(AppError::ConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn claim_copies_patient_from_policy() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let patient = seed_user(&uow, "pat@example.com", Role::Patient).await;
        let mgr = InsuranceManager::new(&uow).unwrap();
        let pol = mgr.create_policy(policy(&patient.id)).await.unwrap();

        let c = mgr.create_claim(claim(&pol.id, 250.0)).await.unwrap();
        assert_eq!(c.patient_id, patient.id);
        assert_eq!(c.status, ClaimStatus::Submitted);
        assert!(c.processed_at.is_none());

        assert!(matches!(
            mgr.create_claim(claim("missing", 10.0)).await,
            Err(AppError::ConstraintViolation(_))
        ));
        assert!(matches!(
            mgr.create_claim(claim(&pol.id, -5.0)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn claim_is_processed_once() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let patient = seed_user(&uow, "pat@example.com", Role::Patient).await;
        let mgr = InsuranceManager::new(&uow).unwrap();
        let pol = mgr.create_policy(policy(&patient.id)).await.unwrap();
        let c = mgr.create_claim(claim(&pol.id, 250.0)).await.unwrap();

        let done = mgr
            .process_claim(
                &c.id,
                ProcessClaimRequest {
                    processing: Some(json!({"approved": 200})),
                },
            )
            .await
            .unwrap();
        assert_eq!(done.status, ClaimStatus::Processed);
        assert_eq!(done.processing, Some(json!({"approved": 200})));
        assert!(done.processed_at.is_some());

        assert!(matches!(
            mgr.process_claim(&c.id, ProcessClaimRequest::default()).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            mgr.process_claim("missing", ProcessClaimRequest::default()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn policy_with_claims_cannot_be_deleted() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let patient = seed_user(&uow, "pat@example.com", Role::Patient).await;
        let mgr = InsuranceManager::new(&uow).unwrap();
        let pol = mgr.create_policy(policy(&patient.id)).await.unwrap();
        let c = mgr.create_claim(claim(&pol.id, 99.5)).await.unwrap();

        assert!(matches!(
            mgr.delete_policy(&pol.id).await,
            Err(AppError::ConstraintViolation(_))
        ));
        assert!(mgr.delete_claim(&c.id).await.unwrap());
        assert!(mgr.delete_policy(&pol.id).await.unwrap());
        assert!(!mgr.delete_policy(&pol.id).await.unwrap());
    }

    #[tokio::test]
    async fn list_policies_by_patient() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let a = seed_user(&uow, "a@example.com", Role::Patient).await;
        let b = seed_user(&uow, "b@example.com", Role::Patient).await;
        let mgr = InsuranceManager::new(&uow).unwrap();
        mgr.create_policy(policy(&a.id)).await.unwrap();
        mgr.create_policy(policy(&a.id)).await.unwrap();

        let for_a = mgr
            .list_policies(PolicyQuery {
                patient_id: Some(a.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_a.len(), 2);
        let for_b = mgr
            .list_policies(PolicyQuery {
                patient_id: Some(b.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(for_b.is_empty());
    }

    #[tokio::test]
    async fn update_policy_changes_only_given_fields() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let patient = seed_user(&uow, "pat@example.com", Role::Patient).await;
        let mgr = InsuranceManager::new(&uow).unwrap();
        let pol = mgr.create_policy(policy(&patient.id)).await.unwrap();

        let updated = mgr
            .update_policy(
                &pol.id,
                UpdatePolicyRequest {
                    premium: Some(1500.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.premium, 1500.0);
        assert_eq!(updated.provider, "Acme Health");
        assert_eq!(updated.coverage, Some(json!({"dental": true})));
    }
}
