//! Strategy lists for product pages, most specific first.

use super::strategy::{Field, FieldPlan, FieldStrategy, MatchRule};

/// Primary buy-box price containers. The minimum-price rule applies here only.
const BUY_BOX_REGIONS: &[(&str, &str)] = &[
    (
        "core price display",
        "#corePriceDisplay_desktop_feature_div span.a-offscreen",
    ),
    ("core price", "#corePrice_feature_div span.a-offscreen"),
];

/// Named single-price containers.
const NAMED_PRICE_CONTAINERS: &[(&str, &str)] = &[
    ("price inside buybox", "#price_inside_buybox"),
    ("our price", "#priceblock_ourprice"),
    ("deal price", "#priceblock_dealprice"),
    ("price to pay", "span.priceToPay span.a-offscreen"),
];

/// Title strategies, most specific first.
pub fn title_plan() -> FieldPlan {
    FieldPlan::new(
        Field::Title,
        vec![
            FieldStrategy::new(
                "title section",
                "#titleSection #productTitle",
                MatchRule::FirstNonEmpty,
            ),
            FieldStrategy::new("product title", "span#productTitle", MatchRule::FirstNonEmpty),
            FieldStrategy::new("title heading", "h1#title", MatchRule::FirstNonEmpty),
        ],
    )
}

/// Price strategies: buy-box minimum, named containers, then any currency-looking offscreen price.
pub fn price_plan() -> FieldPlan {
    let mut strategies: Vec<FieldStrategy> = BUY_BOX_REGIONS
        .iter()
        .map(|&(name, css)| FieldStrategy::new(name, css, MatchRule::MinimumPrice))
        .collect();
    strategies.extend(
        NAMED_PRICE_CONTAINERS
            .iter()
            .map(|&(name, css)| FieldStrategy::new(name, css, MatchRule::ContainsDigit)),
    );
    // Noisy: may pick a cross-sell price, hence last
    strategies.push(FieldStrategy::new(
        "any offscreen price",
        "span.a-offscreen",
        MatchRule::ContainsCurrency,
    ));
    FieldPlan::new(Field::Price, strategies)
}

/// Availability strategies.
pub fn stock_plan() -> FieldPlan {
    FieldPlan::new(
        Field::Stock,
        vec![
            FieldStrategy::new("availability span", "#availability span", MatchRule::FirstNonEmpty),
            FieldStrategy::new("availability block", "#availability", MatchRule::FirstElement),
            FieldStrategy::new("out of stock", "#outOfStock", MatchRule::FirstElement),
        ],
    )
}

/// Rating strategies.
pub fn rating_plan() -> FieldPlan {
    FieldPlan::new(
        Field::Rating,
        vec![
            FieldStrategy::new(
                "rating out of text",
                "span[data-hook='rating-out-of-text']",
                MatchRule::FirstNonEmpty,
            ),
            FieldStrategy::new(
                "review popover",
                "#acrPopover span.a-icon-alt",
                MatchRule::FirstNonEmpty,
            ),
            FieldStrategy::new("icon alt", "span.a-icon-alt", MatchRule::FirstNonEmpty),
        ],
    )
}

/// Review count strategies.
pub fn reviews_plan() -> FieldPlan {
    FieldPlan::new(
        Field::Reviews,
        vec![
            FieldStrategy::new(
                "customer review text",
                "#acrCustomerReviewText",
                MatchRule::FirstNonEmpty,
            ),
            FieldStrategy::new(
                "total review count",
                "span[data-hook='total-review-count']",
                MatchRule::FirstNonEmpty,
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_price_plan_order() {
        let names: Vec<&str> = price_plan().strategies().iter().map(|s| s.name()).collect();
        assert_eq!(names.first(), Some(&"core price display"));
        assert_eq!(names.last(), Some(&"any offscreen price"));
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_buy_box_beats_cross_sell() {
        let doc = Html::parse_document(
            r#"<div id="corePrice_feature_div"><span class="a-offscreen">$20.00</span></div>
               <div class="carousel"><span class="a-offscreen">$5.00</span></div>"#,
        );
        let found = price_plan().evaluate(&doc).expect("price found");
        assert_eq!(found.value, "$20.00");
        assert_eq!(found.strategy, "core price");
    }

    #[test]
    fn test_named_container_requires_digit() {
        let doc = Html::parse_document(
            r#"<span id="priceblock_ourprice">Currently unavailable</span>
               <span id="priceblock_dealprice">$12.34</span>"#,
        );
        let found = price_plan().evaluate(&doc).expect("deal price found");
        assert_eq!(found.value, "$12.34");
        assert_eq!(found.strategy, "deal price");
    }

    #[test]
    fn test_generic_offscreen_fallback() {
        let doc = Html::parse_document(r#"<span class="a-offscreen">€7,49</span>"#);
        let found = price_plan().evaluate(&doc).expect("fallback price found");
        assert_eq!(found.strategy, "any offscreen price");
    }

    #[test]
    fn test_title_fallback_to_heading() {
        let doc = Html::parse_document(r#"<h1 id="title"> Travel Mug </h1>"#);
        assert_eq!(
            title_plan().evaluate(&doc).map(|m| m.value),
            Some("Travel Mug".to_string())
        );
    }

    #[test]
    fn test_stock_whole_block_when_spans_blank() {
        let doc = Html::parse_document(
            r#"<div id="availability"><span> </span>
                 Only 2 left in stock.
               </div>"#,
        );
        assert_eq!(
            stock_plan().evaluate(&doc).map(|m| m.value),
            Some("Only 2 left in stock.".to_string())
        );
    }

    #[test]
    fn test_rating_and_reviews() {
        let doc = Html::parse_document(
            r#"<div id="acrPopover"><span class="a-icon-alt">4.6 out of 5 stars</span></div>
               <span data-hook="total-review-count">1,024 global ratings</span>"#,
        );
        assert_eq!(
            rating_plan().evaluate(&doc).map(|m| m.value),
            Some("4.6 out of 5 stars".to_string())
        );
        assert_eq!(
            reviews_plan().evaluate(&doc).map(|m| m.value),
            Some("1,024 global ratings".to_string())
        );
    }
}
