//! The monitored-entity roster and the search-engine-proxied query feeds
//! generated from it. Pure configuration data: collectors consume it, the
//! store re-seeds its entity arrays from it on every load.

use crate::model::{Entity, EntityType};

/// One search-engine-proxied feed (Google News / Bing News RSS over a query
/// template). `entity` binds the feed to its owning organization; unbound
/// feeds fall back to substring matching against entry text.
#[derive(Debug, Clone)]
pub struct SearchFeed {
    pub name: String,
    pub url: String,
    pub entity: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Roster {
    pub competitors: Vec<Entity>,
    pub partners: Vec<Entity>,
    pub linkedin_search: Vec<SearchFeed>,
    pub press_search: Vec<SearchFeed>,
}

impl Roster {
    /// The production roster: competitor POS vendors and ecosystem partners.
    pub fn builtin() -> Self {
        let competitors = competitor_entities();
        let partners = partner_entities();
        let mut linkedin_search = Vec::new();
        let mut press_search = Vec::new();
        for entity in competitors.iter().chain(partners.iter()) {
            linkedin_search.extend(linkedin_search_feeds_for(&entity.name));
            press_search.extend(press_search_feeds_for(&entity.name));
        }
        Self {
            competitors,
            partners,
            linkedin_search,
            press_search,
        }
    }

    /// Roster with no generated search feeds; useful for tests that inject
    /// their own.
    pub fn with_entities(competitors: Vec<Entity>, partners: Vec<Entity>) -> Self {
        Self {
            competitors,
            partners,
            linkedin_search: Vec::new(),
            press_search: Vec::new(),
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.competitors.iter().chain(self.partners.iter())
    }

    /// Resolve a search feed to its owning entity: the explicit binding
    /// first, else the first entity whose name appears in the feed name.
    pub fn feed_owner(&self, feed: &SearchFeed) -> Option<&Entity> {
        if let Some(bound) = &feed.entity {
            if let Some(entity) = self
                .entities()
                .find(|entity| entity.name.eq_ignore_ascii_case(bound))
            {
                return Some(entity);
            }
        }
        let feed_name = feed.name.to_lowercase();
        self.entities()
            .find(|entity| feed_name.contains(&entity.name.to_lowercase()))
    }

    /// First entity whose name appears in the (lowercased) text blob.
    pub fn match_in_text(&self, blob_lower: &str) -> Option<&Entity> {
        self.entities()
            .find(|entity| blob_lower.contains(&entity.name.to_lowercase()))
    }
}

fn encode_query(query: &str) -> String {
    url::form_urlencoded::byte_serialize(query.as_bytes()).collect()
}

/// LinkedIn activity queries proxied through news-search RSS endpoints.
pub fn linkedin_search_feeds_for(entity_name: &str) -> Vec<SearchFeed> {
    let queries = [
        format!("site:linkedin.com \"{entity_name}\" \"activity-\""),
        format!("site:linkedin.com/posts \"{entity_name}\""),
        format!("site:linkedin.com \"{entity_name}\" integration"),
        format!("site:linkedin.com \"{entity_name}\" partnership"),
        format!("site:linkedin.com \"{entity_name}\" product launch"),
        format!("site:linkedin.com \"{entity_name}\" employee"),
        format!("site:linkedin.com \"{entity_name}\" VP OR Director OR Head of OR CTO OR CEO"),
    ];
    search_feeds(entity_name, "LinkedIn", &queries)
}

/// Press-release and publication queries proxied the same way.
pub fn press_search_feeds_for(entity_name: &str) -> Vec<SearchFeed> {
    let queries = [
        format!("\"{entity_name}\" \"press release\""),
        format!("\"{entity_name}\" \"announces\""),
        format!("\"{entity_name}\" \"partnership\""),
        format!("\"{entity_name}\" \"launches\""),
        format!("\"{entity_name}\" \"new product\""),
        format!("\"{entity_name}\" \"funding\""),
        format!("site:prnewswire.com \"{entity_name}\""),
        format!("site:businesswire.com \"{entity_name}\""),
        format!("site:globenewswire.com \"{entity_name}\""),
        format!("site:einnews.com \"{entity_name}\""),
        format!("site:finance.yahoo.com \"{entity_name}\" press release"),
    ];
    search_feeds(entity_name, "Press", &queries)
}

fn search_feeds(entity_name: &str, topic: &str, queries: &[String]) -> Vec<SearchFeed> {
    let mut feeds = Vec::with_capacity(queries.len() * 2);
    for query in queries {
        let encoded = encode_query(query);
        feeds.push(SearchFeed {
            name: format!("Google {topic} - {entity_name} - {query}"),
            url: format!("https://news.google.com/rss/search?q={encoded}"),
            entity: Some(entity_name.to_string()),
        });
        feeds.push(SearchFeed {
            name: format!("Bing {topic} - {entity_name} - {query}"),
            url: format!("https://www.bing.com/news/search?q={encoded}&format=RSS"),
            entity: Some(entity_name.to_string()),
        });
    }
    feeds
}

fn entity(
    name: &str,
    domain: &str,
    entity_type: EntityType,
    rss: &[&str],
    web_pages: &[&str],
    linkedin_company_pages: &[&str],
) -> Entity {
    Entity {
        name: name.to_string(),
        domain: domain.to_string(),
        entity_type,
        rss: rss.iter().map(|s| s.to_string()).collect(),
        web_pages: web_pages.iter().map(|s| s.to_string()).collect(),
        linkedin_company_pages: linkedin_company_pages
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

fn competitor_entities() -> Vec<Entity> {
    use EntityType::Competitor;
    vec![
        entity(
            "Toast",
            "toasttab.com",
            Competitor,
            &["https://pos.toasttab.com/blog/rss.xml"],
            &[
                "https://pos.toasttab.com/blog",
                "https://pos.toasttab.com/pricing",
                "https://careers.toasttab.com/jobs",
            ],
            &["https://www.linkedin.com/company/toast-inc/"],
        ),
        entity(
            "Square",
            "squareup.com",
            Competitor,
            &["https://squareup.com/us/en/the-bottom-line/rss"],
            &[
                "https://squareup.com/us/en/point-of-sale/restaurants",
                "https://squareup.com/us/en/point-of-sale/restaurants/pricing",
                "https://careers.squareup.com/us/en/search-results",
            ],
            &["https://www.linkedin.com/company/block/"],
        ),
        entity(
            "Clover",
            "clover.com",
            Competitor,
            &[],
            &[
                "https://www.clover.com/blog",
                "https://www.clover.com/pricing",
                "https://www.clover.com/restaurant-pos",
            ],
            &["https://www.linkedin.com/company/clover-network-inc/"],
        ),
        entity(
            "Lightspeed",
            "lightspeedhq.com",
            Competitor,
            &["https://www.lightspeedhq.com/blog/feed/"],
            &[
                "https://www.lightspeedhq.com/pos/restaurant/",
                "https://www.lightspeedhq.com/pricing/",
                "https://www.lightspeedhq.com/careers/",
            ],
            &["https://www.linkedin.com/company/lightspeed-commerce/"],
        ),
        entity(
            "Aloha (NCR Voyix)",
            "ncrvoyix.com",
            Competitor,
            &[],
            &[
                "https://www.ncrvoyix.com/restaurants",
                "https://www.ncrvoyix.com/newsroom",
                "https://careers.ncrvoyix.com/",
            ],
            &["https://www.linkedin.com/company/ncr-voyix/"],
        ),
        entity(
            "Shift4",
            "shift4.com",
            Competitor,
            &["https://investors.shift4.com/rss/news-releases.xml"],
            &[
                "https://shift4.com/industries/restaurants",
                "https://shift4.com/blog",
                "https://shift4.com/careers",
            ],
            &["https://www.linkedin.com/company/shift4/"],
        ),
        entity(
            "TouchBistro",
            "touchbistro.com",
            Competitor,
            &[],
            &[
                "https://www.touchbistro.com/blog/",
                "https://www.touchbistro.com/pricing/",
                "https://www.touchbistro.com/careers/",
            ],
            &["https://www.linkedin.com/company/touchbistro/"],
        ),
        entity(
            "Revel Systems",
            "revelsystems.com",
            Competitor,
            &[],
            &[
                "https://revelsystems.com/blog/",
                "https://revelsystems.com/restaurant-pos-system/",
                "https://revelsystems.com/company/news/",
            ],
            &["https://www.linkedin.com/company/revel-systems/"],
        ),
        entity(
            "PAR Brink",
            "partech.com",
            Competitor,
            &[],
            &[
                "https://www.partech.com/blog/",
                "https://www.partech.com/products/brink-pos/",
                "https://www.partech.com/newsroom/",
            ],
            &["https://www.linkedin.com/company/par-technology/"],
        ),
        entity(
            "Oracle MICROS",
            "oracle.com",
            Competitor,
            &[],
            &[
                "https://www.oracle.com/food-beverage/micros/",
                "https://www.oracle.com/news/",
                "https://careers.oracle.com/",
            ],
            &["https://www.linkedin.com/company/oracle/"],
        ),
    ]
}

fn partner_entities() -> Vec<Entity> {
    use EntityType::Partner;
    vec![
        entity(
            "Shogo",
            "shogo.io",
            Partner,
            &[],
            &["https://shogo.io/blog/", "https://shogo.io/"],
            &["https://www.linkedin.com/company/shogo-technologies/"],
        ),
        entity(
            "Davo",
            "davochain.com",
            Partner,
            &[],
            &["https://davochain.com/resources/", "https://davochain.com/"],
            &["https://www.linkedin.com/company/davo-by-avalara/"],
        ),
        entity(
            "Chowly",
            "chowly.com",
            Partner,
            &[],
            &["https://www.chowly.com/blog/", "https://www.chowly.com/"],
            &["https://www.linkedin.com/company/chowly-inc/"],
        ),
        entity(
            "Margin Edge",
            "marginedge.com",
            Partner,
            &[],
            &[
                "https://www.marginedge.com/blog",
                "https://www.marginedge.com/product",
                "https://www.marginedge.com/company",
            ],
            &["https://www.linkedin.com/company/marginedge/"],
        ),
        entity("Reddie", "reddie.com", Partner, &[], &["https://reddie.com/"], &[]),
        entity(
            "7shifts",
            "7shifts.com",
            Partner,
            &[],
            &["https://www.7shifts.com/blog", "https://www.7shifts.com/"],
            &["https://www.linkedin.com/company/7shifts/"],
        ),
        entity(
            "DoorDash",
            "doordash.com",
            Partner,
            &["https://about.doordash.com/en-us/news/rss"],
            &[
                "https://about.doordash.com/en-us/news",
                "https://merchant.doordash.com/en-us/products",
            ],
            &["https://www.linkedin.com/company/doordash/"],
        ),
        entity(
            "Uber Eats",
            "ubereats.com",
            Partner,
            &[],
            &[
                "https://www.uber.com/newsroom/",
                "https://merchants.ubereats.com/us/en/services/",
            ],
            &["https://www.linkedin.com/company/uber-com/"],
        ),
        entity(
            "Popmenu",
            "popmenu.com",
            Partner,
            &[],
            &["https://get.popmenu.com/blog/", "https://get.popmenu.com/"],
            &["https://www.linkedin.com/company/popmenu/"],
        ),
        entity(
            "Loman",
            "loman.ai",
            Partner,
            &[],
            &["https://www.loman.ai/", "https://www.loman.ai/blog"],
            &["https://www.linkedin.com/company/loman-ai/"],
        ),
        entity(
            "Parafin",
            "parafin.com",
            Partner,
            &[],
            &["https://www.parafin.com/blog", "https://www.parafin.com/"],
            &["https://www.linkedin.com/company/parafin/"],
        ),
        entity(
            "Deliverect",
            "deliverect.com",
            Partner,
            &[],
            &[
                "https://www.deliverect.com/en/blog",
                "https://www.deliverect.com/en",
            ],
            &["https://www.linkedin.com/company/deliverect/"],
        ),
    ]
}
