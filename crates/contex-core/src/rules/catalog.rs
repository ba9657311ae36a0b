//! The named extraction-rule catalog.
//!
//! A read-only table built once and shared across any number of concurrent
//! pipeline runs. Each rule is an ordered list of pattern alternatives, an
//! optional value transform, and a base confidence.

use regex::{Regex, RegexBuilder};

use super::transforms::Transform;

/// One named extraction rule.
#[derive(Debug)]
pub struct ExtractionRule {
    /// Unique field name this rule extracts.
    pub name: &'static str,

    /// Pattern alternatives, consulted in declaration order.
    pub alternatives: Vec<Regex>,

    /// Transform applied to the raw matched substring.
    pub transform: Option<Transform>,

    /// Base confidence assigned to a match.
    pub base_confidence: f32,
}

/// Immutable catalog of extraction rules.
#[derive(Debug)]
pub struct PatternCatalog {
    rules: Vec<ExtractionRule>,
}

/// The required/important field lists driving gap analysis and the
/// completeness bonus.
#[derive(Debug, Clone)]
pub struct FieldLists {
    pub required: Vec<&'static str>,
    pub important: Vec<&'static str>,
}

impl Default for FieldLists {
    fn default() -> Self {
        Self {
            required: vec![
                "party_1_name",
                "party_2_name",
                "effective_date",
                "contract_value",
                "payment_terms",
            ],
            important: vec![
                "termination_date",
                "governing_law",
                "auto_renewal",
                "notice_period",
                "liability_cap",
                "line_items",
                "total_amount",
                "payment_net_days",
                "payment_methods",
            ],
        }
    }
}

/// Compile one rule. Patterns are matched with multi-line and
/// dot-matches-newline semantics, like the rest of the catalog.
fn rule(
    name: &'static str,
    patterns: &[&str],
    transform: Option<Transform>,
    base_confidence: f32,
) -> ExtractionRule {
    let alternatives = patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .multi_line(true)
                .dot_matches_new_line(true)
                .build()
                .unwrap_or_else(|e| panic!("invalid pattern for rule {name}: {e}"))
        })
        .collect();

    ExtractionRule {
        name,
        alternatives,
        transform,
        base_confidence,
    }
}

impl PatternCatalog {
    /// The standard contract-extraction catalog.
    pub fn standard() -> Self {
        let rules = vec![
            // Party identification
            rule(
                "party_1_name",
                &[
                    r"(?i)(?:between|by\s+and\s+between)\s+([A-Z][A-Za-z\s&,.\-]+?)(?:\s+\(|,|\s+a\s+|\s+and\b)",
                    r"(?i)^This\s+(?:Agreement|Contract).*?by\s+and\s+between\s+([A-Z][A-Za-z\s&,.\-]+?)(?:\s+\(|,)",
                    r"(?i)(?:Client|Customer|Buyer|Purchaser):\s*([A-Z][A-Za-z\s&,.\-]+?)(?:\n|,|\()",
                    r#""Party A"[:\s]+means\s+([A-Z][A-Za-z\s&,.\-]+?)(?:\s+\(|,|\s+and\b)"#,
                ],
                None,
                0.6,
            ),
            rule(
                "party_2_name",
                &[
                    r"(?i)(?:between.*?and|,\s+and)\s+([A-Z][A-Za-z\s&,.\-]+?)(?:\s+\(|,|\s+\)|$)",
                    r"(?i)(?:Vendor|Supplier|Seller|Provider|Contractor):\s*([A-Z][A-Za-z\s&,.\-]+?)(?:\n|,|\()",
                    r#""Party B"[:\s]+means\s+([A-Z][A-Za-z\s&,.\-]+?)(?:\s+\(|,|\s+and\b)"#,
                ],
                None,
                0.6,
            ),
            // Dates
            rule(
                "effective_date",
                &[
                    r"(?i)\b(?:effective|commencement|start)\s+date[:\s]+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)effective\s+as\s+of\s+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)shall\s+commence\s+on\s+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)(?:agreement\s+)?(?:effective|executed|signed|dated)\s+(?:on\s+)?([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)this\s+(?:agreement|contract).*?(?:dated|executed|signed)\s+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)(?:contract|agreement)\s+date[:\s]+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)dated\s+this\s+\d{1,2}(?:st|nd|rd|th)?\s+day\s+of\s+([A-Za-z]+,?\s+\d{4})",
                    r"(?i)executed\s+on\s+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                ],
                Some(Transform::NormalizeDate),
                0.7,
            ),
            rule(
                "execution_date",
                &[
                    r"(?i)(?:executed|signed|dated)\s+(?:this|on)\s+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)date\s+of\s+execution[:\s]+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                ],
                Some(Transform::NormalizeDate),
                0.65,
            ),
            rule(
                "termination_date",
                &[
                    r"(?i)(?:terminat|expir|end)(?:es|ing|ation)?\s+(?:on|date)[:\s]+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)through\s+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)until\s+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)(?:contract|agreement)\s+(?:terminates|expires|ends)\s+(?:on\s+)?([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)(?:expiry|expiration)\s+date[:\s]+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)end\s+date[:\s]+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)valid\s+(?:until|through)\s+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                    r"(?i)contract\s+period[:\s]+.*?(?:to|until|through)\s+([A-Za-z]+\s+\d{1,2},?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                ],
                Some(Transform::NormalizeDate),
                0.65,
            ),
            rule(
                "contract_term",
                &[
                    r"(?i)contract\s+term[:\s]+(\d+\s+(?:months?|years?))",
                    r"(?i)(?:term|period)\s+of\s+(\d+\s+(?:months?|years?))",
                    r"(?i)for\s+a\s+(?:term|period)\s+of\s+(\d+\s+(?:months?|years?))",
                    r"(?i)(\d+[-\s](?:month|year)s?)\s+(?:term|period|contract)",
                ],
                None,
                0.7,
            ),
            // Financial details
            rule(
                "contract_value",
                &[
                    r"(?i)total\s+(?:contract\s+)?(?:value|amount|price)[:\s]+\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)(?:contract|total)\s+(?:sum|consideration)[:\s]+\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)(?:annual\s+contract\s+value|total\s+annual\s+value|acv)[:\s]+\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)annual\s+contract\s+value[:\s]+\$?([\d,]+(?:\.\d{2})?)(?:\s+\+[^=]*)?(?:\s*=\s*\$?([\d,]+(?:\.\d{2})?))?",
                    r"(?i)total\s+annual\s+value[:\s]+\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)total\s+monthly\s+amount[:\s]+\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)monthly\s+(?:fee|payment|amount)[:\s]+\$?([\d,]+(?:\.\d{2})?)",
                ],
                Some(Transform::ParseMoney),
                0.7,
            ),
            rule(
                "currency",
                &[
                    r"(?i)\b(USD|EUR|GBP|INR|CAD|AUD|CNY|JPY)\b",
                    r"(?i)\b(dollars|euros|pounds|rupees)\b",
                    r"([$€£₹¥])",
                ],
                Some(Transform::NormalizeCurrency),
                0.8,
            ),
            rule(
                "payment_terms",
                &[
                    r"(?i)payment\s+terms[:\s]+([^\n]+)",
                    r"(?i)\bnet\s+(\d+)\s*(?:days)?\b",
                    r"(?i)payment\s+(?:is\s+)?due\s+(?:within\s+)?(\d+)\s+days",
                    r"(?i)(\d+)\s+days\s+(?:from|after)\s+(?:invoice|receipt)",
                ],
                None,
                0.65,
            ),
            // Populated only on explicit recurring-billing context; generic
            // "per month" phrasing (late fees) must never match.
            rule(
                "billing_frequency",
                &[
                    r"(?i)\b(monthly|quarterly|annually|yearly|weekly|bi-weekly|semi-annually)\s+(?:billing|payment|invoice)\s+(?:schedule|cycle|frequency)",
                    r"(?i)(?:billed|invoiced|paid)\s+(monthly|quarterly|annually|yearly|weekly)\s+(?:in\s+advance|recurring)",
                    r"(?i)(?:recurring|subscription)\s+(?:billing|payment)\s*:\s*(monthly|quarterly|annually|yearly|weekly)",
                    r"(?i)billing\s+cycle\s*:\s*(monthly|quarterly|annually|yearly|weekly)",
                    r"(?i)subscription\s+(?:billing|payment)\s*:\s*(monthly|quarterly|annually|yearly|weekly)",
                ],
                None,
                0.8,
            ),
            // Legal terms
            rule(
                "governing_law",
                &[
                    r"(?i)governed\s+by\s+(?:the\s+)?laws?\s+of\s+(?:the\s+)?(?:state\s+of\s+)?([A-Za-z\s]+?)(?:\.|,|\n)",
                    r"(?i)(?:applicable|governing)\s+law[:\s]+([A-Za-z\s]+?)(?:\.|,|\n)",
                    r"(?i)subject\s+to\s+(?:the\s+)?(?:exclusive\s+)?jurisdiction\s+of\s+([A-Za-z\s]+?)(?:\.|,|\n)",
                    r"(?i)governing\s+law[:\s]+(?:this\s+(?:agreement|contract)\s+(?:shall\s+be\s+)?)?(?:governed\s+by\s+)?(?:the\s+)?(?:laws?\s+of\s+)?(?:the\s+)?(?:state\s+of\s+)?([A-Za-z\s]+?)(?:\.|,|\n|dispute)",
                    r"(?i)this\s+(?:agreement|contract).*?(?:governed|subject)\s+to.*?(?:laws?\s+of\s+)?(?:the\s+)?(?:state\s+of\s+)?([A-Za-z\s]+?)(?:\.|,|\n)",
                    r"(?i)laws?\s+of\s+(?:the\s+)?(?:state\s+of\s+)?([A-Za-z\s]+?)\s+(?:shall\s+)?(?:apply|govern)",
                    r"(?i)jurisdiction[:\s]+([A-Za-z\s]+?)(?:\.|,|\n|court)",
                    r"(?i)disputes.*?(?:governed|resolved).*?(?:in\s+)?(?:the\s+)?(?:state\s+of\s+)?([A-Za-z\s]+?)(?:\.|,|\n)",
                ],
                None,
                0.75,
            ),
            rule(
                "liability_cap",
                &[
                    r"(?i)liability.*?(?:shall\s+not\s+exceed|limited\s+to|cap(?:ped)?\s+at)\s+\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)maximum\s+liability.*?\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)aggregate\s+liability.*?\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)liability.*?(?:capped|limited|restricted|maximum).*?\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)(?:total|aggregate|maximum)\s+(?:damages|liability).*?\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)liability\s+(?:is\s+)?limited\s+to\s+(?:a\s+maximum\s+of\s+)?\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)damages.*?(?:shall\s+not\s+exceed|limited\s+to|maximum\s+of)\s+\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)(?:cap\s+on\s+)?(?:damages|liability)[:\s]+\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)liability.*?(?:up\s+to|not\s+to\s+exceed)\s+\$?([\d,]+(?:\.\d{2})?)",
                    r"(?i)liability.*?limited\s+to\s+(\d+)\s+months?\s+of\s+(?:fees|payments?)",
                ],
                Some(Transform::ParseMoney),
                0.65,
            ),
            rule(
                "confidentiality",
                &[
                    r"(?i)(confidential(?:ity)?|non-disclosure|NDA)(?:\s+(?:clause|provision|agreement))?",
                    r"(?i)shall\s+(?:keep|maintain|treat\s+as)\s+confidential",
                    r"(?i)proprietary\s+and\s+confidential\s+information",
                ],
                Some(Transform::Presence),
                0.8,
            ),
            // Renewal terms
            rule(
                "auto_renewal",
                &[
                    r"(?i)\bauto(?:matic(?:ally)?)?\s*renew(?:al|s|ed)?\b",
                    r"(?i)\bauto[-\s]renews?\b",
                    r"(?i)auto-renewal",
                    r"(?i)shall\s+automatically\s+renew",
                    r"(?i)contract\s+auto[-\s]renews?",
                    r"(?i)unless.*?(?:terminated|cancelled).*?automatically\s+renew",
                    r"(?i)contract\s+auto-renews\s+for\s+additional",
                    r"(?i)auto-renewal[:\s]+yes",
                    r"(?i)auto-renewal[:\s]+true",
                    r"(?i)(?:contract|agreement)\s+(?:shall\s+)?(?:automatically\s+)?renew(?:s)?(?:\s+(?:for|automatically))?",
                    r"(?i)(?:renew|extend)(?:al|s)?\s+(?:automatic(?:ally)?|auto)",
                    r"(?i)(?:automatically\s+)?(?:renew|extend)(?:s|ed|ing)?\s+(?:for\s+)?(?:additional|successive|further)\s+(?:term|period)",
                    r"(?i)(?:term|contract)\s+(?:shall\s+)?(?:be\s+)?(?:automatically\s+)?(?:renewed|extended)",
                    r"(?i)unless\s+(?:either\s+party\s+)?(?:provides?\s+)?(?:written\s+)?notice.*?(?:renew|extend)",
                    r"(?i)renewal[:\s]+(?:automatic|yes|true)",
                ],
                Some(Transform::Presence),
                0.75,
            ),
            rule(
                "renewal_term",
                &[
                    r"(?i)renew.*?for\s+(?:an?\s+)?(?:additional\s+)?(\d+)\s+(?:year|month|day)s?",
                    r"(?i)renewal\s+(?:term|period)[:\s]+(\d+)\s+(?:year|month|day)s?",
                    r"(?i)(?:successive|additional)\s+(?:term|period)s?\s+of\s+(\d+)\s+(?:year|month|day)s?",
                ],
                None,
                0.65,
            ),
            rule(
                "notice_period",
                &[
                    r"(?i)(\d+)\s+days?\s+(?:written\s+)?notice",
                    r"(?i)notice\s+(?:period|of)[:\s]+(\d+)\s+days?",
                    r"(?i)at\s+least\s+(\d+)\s+days?\s+(?:prior\s+)?(?:written\s+)?notice",
                    r"(?i)(?:with\s+)?(\d+)\s+days?\s+(?:prior\s+)?(?:written\s+)?notice\s+(?:of\s+termination|to\s+terminate)",
                    r"(?i)terminate.*?(?:with\s+)?(\d+)\s+days?\s+(?:advance\s+)?(?:written\s+)?notice",
                    r"(?i)(?:written\s+)?notice\s+of\s+(?:at\s+least\s+)?(\d+)\s+days?",
                    r"(?i)(\d+)\s+days?\s+(?:advance\s+)?(?:written\s+)?notice\s+(?:prior\s+to|before)",
                    r"(?i)(?:minimum|required)\s+notice[:\s]+(\d+)\s+days?",
                    r"(?i)notice\s+requirement[:\s]+(\d+)\s+days?",
                    r"(?i)(\d+)\s+days?\s+notice\s+(?:shall\s+be\s+)?(?:given|provided|required)",
                ],
                None,
                0.7,
            ),
            // Service levels
            rule(
                "sla_uptime",
                &[
                    r"(?i)uptime.*?(\d+(?:\.\d+)?)\s*%",
                    r"(?i)availability.*?(\d+(?:\.\d+)?)\s*%",
                    r"(?i)(\d+(?:\.\d+)?)\s*%\s+(?:uptime|availability)",
                ],
                Some(Transform::ParseFloat),
                0.75,
            ),
            rule(
                "support_hours",
                &[
                    r"(?i)support.*?(\d+)\s*[x×]\s*(\d+)",
                    r"(?i)(?:24[/x×]7|24\s+hours)",
                    r"(?i)business\s+hours.*?(\d+:\d+.*?\d+:\d+)",
                ],
                None,
                0.65,
            ),
            // Termination clauses
            rule(
                "termination_for_convenience",
                &[
                    r"(?i)terminat\w+\s+(?:for\s+)?convenience",
                    r"(?i)either\s+party\s+may\s+terminate",
                    r"(?i)without\s+cause.*?terminat",
                ],
                Some(Transform::Presence),
                0.7,
            ),
            rule(
                "termination_for_cause",
                &[
                    r"(?i)terminat\w+\s+for\s+cause",
                    r"(?i)material\s+breach.*?terminat",
                    r"(?i)default.*?terminat",
                ],
                Some(Transform::Presence),
                0.7,
            ),
            // Signatures
            rule(
                "signatory_1_name",
                &[
                    r"(?i)(?:for\s+.*?\n)?name\s*:\s*([A-Za-z\s.]+?)(?:\n|title|signature)",
                    r"(?i)authorized\s+representative\s*:\s*([A-Za-z\s.]+?)(?:\n|$)",
                    r"(?i)signed\s+by\s*:\s*([A-Za-z\s.]+?)(?:\n|$)",
                ],
                None,
                0.7,
            ),
            rule(
                "signatory_1_title",
                &[
                    r"(?i)title\s*:\s*([A-Za-z\s.]+?)(?:\n|signature)",
                    r"(?i)([A-Za-z\s]+(?:director|manager|head|lead|officer))\s*(?:\n|$)",
                ],
                None,
                0.65,
            ),
            rule(
                "signatory_2_name",
                &[
                    r"(?i)(?:for\s+.*?\n.*?name\s*:\s*[^\n]+\n.*?){1}name\s*:\s*([A-Za-z\s.]+?)(?:\n|title|signature)",
                ],
                None,
                0.7,
            ),
            rule(
                "signatory_2_title",
                &[
                    r"(?i)(?:for\s+.*?\n.*?title\s*:\s*[^\n]+\n.*?){1}title\s*:\s*([A-Za-z\s.]+?)(?:\n|signature)",
                ],
                None,
                0.65,
            ),
            // Contact information
            rule(
                "primary_contact_name",
                &[
                    r"(?i)primary\s+contact\s*:\s*([A-Za-z\s.]+?)(?:\s+\([^)]+\)|—|$)",
                    r"(?i)contact\s*:\s*([A-Za-z\s.]+?)(?:\s+\([^)]+\)|—|$)",
                ],
                None,
                0.8,
            ),
            rule(
                "primary_contact_email",
                &[r"(?i)([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})"],
                None,
                0.9,
            ),
            rule(
                "customer_address",
                &[
                    r"(?i)(?:customer\s+)?address\s*:\s*([^,\n]+,\s*[^,\n]+,\s*[^,\n]+)",
                    r"(?i)(\d+\s+[A-Za-z\s]+,\s*[A-Za-z\s]+,\s*[A-Z]{2}\s+\d{5}(?:-\d{4})?,\s*[A-Z]{2,3})",
                ],
                None,
                0.8,
            ),
        ];

        Self { rules }
    }

    /// All rules in catalog order.
    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    /// Look up a rule by field name.
    pub fn get(&self, name: &str) -> Option<&ExtractionRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Whether a field name belongs to the standard schema.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_compiles_and_names_are_unique() {
        let catalog = PatternCatalog::standard();
        assert!(catalog.rules().len() >= 25);

        let mut names: Vec<&str> = catalog.rules().iter().map(|r| r.name).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn test_base_confidences_in_range() {
        for rule in PatternCatalog::standard().rules() {
            assert!(
                (0.0..=1.0).contains(&rule.base_confidence),
                "{} out of range",
                rule.name
            );
        }
    }

    #[test]
    fn test_billing_frequency_rejects_late_fee_phrasing() {
        let catalog = PatternCatalog::standard();
        let rule = catalog.get("billing_frequency").unwrap();

        let late_fee_text = "Late Fee: 2% per month on overdue balances";
        assert!(!rule.alternatives.iter().any(|p| p.is_match(late_fee_text)));

        let explicit = "Billing Cycle: monthly";
        assert!(rule.alternatives.iter().any(|p| p.is_match(explicit)));
    }

    #[test]
    fn test_field_lists_default() {
        let lists = FieldLists::default();
        assert_eq!(lists.required.len(), 5);
        assert_eq!(lists.important.len(), 9);
        assert!(lists.required.contains(&"contract_value"));
        assert!(lists.important.contains(&"line_items"));
    }
}
