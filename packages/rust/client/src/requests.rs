//! Request descriptors for the catalog JSON endpoint.
//!
//! Every call is a single POST whose body names one operation:
//! `{ "<operation>": { "articleCountry": .., "lang": .., "provider": .., ... } }`.

use serde_json::{Map, Value, json};

use tecdoc_shared::ApiConfig;

// ---------------------------------------------------------------------------
// ApiRequest
// ---------------------------------------------------------------------------

/// One request to the catalog endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Operation name, e.g. `getArticles`.
    pub operation: &'static str,
    /// Operation parameters, including the locale/provider triple.
    pub params: Map<String, Value>,
}

impl ApiRequest {
    /// The JSON body sent on the wire.
    pub fn body(&self) -> Value {
        let mut body = Map::with_capacity(1);
        body.insert(self.operation.to_string(), Value::Object(self.params.clone()));
        Value::Object(body)
    }
}

/// A linked article/vehicle pair, as returned by the linkage listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedPair {
    pub article_link_id: i64,
    pub linking_target_id: i64,
}

// ---------------------------------------------------------------------------
// Request builders
// ---------------------------------------------------------------------------

/// Builds requests carrying the configured country, language, and provider.
#[derive(Debug, Clone)]
pub struct Requests {
    country: String,
    lang: String,
    provider: u32,
}

impl Requests {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            country: config.country.clone(),
            lang: config.lang.clone(),
            provider: config.provider,
        }
    }

    fn request(&self, operation: &'static str, extra: Value) -> ApiRequest {
        let mut params = Map::new();
        params.insert("articleCountry".into(), json!(self.country));
        params.insert("lang".into(), json!(self.lang));
        params.insert("provider".into(), json!(self.provider));
        if let Value::Object(extra) = extra {
            params.extend(extra);
        }
        ApiRequest { operation, params }
    }

    /// Search articles by number for one supplier, with everything the article row needs.
    pub fn search_articles(&self, supplier_id: i64, article_number: &str) -> ApiRequest {
        self.request(
            "getArticles",
            json!({
                "searchQuery": article_number,
                "dataSupplierIds": supplier_id,
                "includeMisc": true,
                "includeGenericArticles": true,
                "includeLinkages": true,
                "includeAccessoryArticles": true,
                "includePDFs": true,
                "includeImages": true,
                "includeLinks": true,
                "assemblyGroupFacetOptions": {
                    "enabled": true,
                    "assemblyGroupType": "O",
                    "includeCompleteTree": true
                }
            }),
        )
    }

    /// Fetch articles by their internal ids (GTINs, assembly groups, images).
    pub fn articles_by_id(&self, article_ids: &[i64]) -> ApiRequest {
        self.request(
            "getArticles",
            json!({
                "articleIds": article_ids,
                "includeGTINs": true,
                "includeLinkages": true,
                "includeImages": true,
                "includeLinks": true,
                "includeGenericArticles": true,
                "includeAssemblyGroups": true
            }),
        )
    }

    /// Direct number search, used for the article's display name and internal id.
    pub fn direct_search(&self, brand_id: i64, article_number: &str) -> ApiRequest {
        self.request(
            "getArticleDirectSearchAllNumbersWithState",
            json!({
                "articleNumber": article_number,
                "brandId": brand_id,
                "numberType": 0,
                "includeImages": true
            }),
        )
    }

    /// List the vehicle linkages of an article.
    pub fn article_linkages(&self, article_id: i64, linking_target_type: &str) -> ApiRequest {
        self.request(
            "getArticleLinkedAllLinkingTarget3",
            json!({
                "articleId": article_id,
                "linkingTargetType": linking_target_type
            }),
        )
    }

    /// Resolve linked pairs into vehicle details.
    pub fn linkage_details(
        &self,
        article_id: i64,
        pairs: &[LinkedPair],
        linking_target_type: &str,
    ) -> ApiRequest {
        let array: Vec<Value> = pairs
            .iter()
            .map(|p| {
                json!({
                    "articleLinkId": p.article_link_id,
                    "linkingTargetId": p.linking_target_id
                })
            })
            .collect();
        self.request(
            "getArticleLinkedAllLinkingTargetsByIds3",
            json!({
                "articleId": article_id,
                "linkedArticlePairs": { "array": array },
                "linkingTargetType": linking_target_type
            }),
        )
    }

    pub fn article_criteria(&self, article_id: i64) -> ApiRequest {
        self.request("getArticleCriteria", json!({ "articleId": article_id }))
    }

    pub fn article_references(&self, article_id: i64) -> ApiRequest {
        self.request("getArticleReferences", json!({ "articleId": article_id }))
    }

    pub fn article_components(&self, article_id: i64) -> ApiRequest {
        self.request("getArticleComponents", json!({ "articleId": article_id }))
    }

    pub fn article_relations(&self, article_id: i64) -> ApiRequest {
        self.request("getArticleRelations", json!({ "articleId": article_id }))
    }

    pub fn brand_info(&self, supplier_id: i64) -> ApiRequest {
        self.request("getBrandInfo", json!({ "supplierId": supplier_id }))
    }

    /// Generic article + assembly groups of an article (linking target `P`).
    pub fn classification(&self, article_id: i64) -> ApiRequest {
        self.request(
            "getArticleLinkedAllLinkingTarget2",
            json!({
                "articleId": article_id,
                "linkingTargetType": "P"
            }),
        )
    }
}
