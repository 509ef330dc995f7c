/*!
 * Integration tests for the grammar repository
 */

use std::collections::HashSet;

use cefr_query::{GrammarField, GrammarLevel, GrammarQuery, GrammarSearch};

use crate::common::{self, GRAMMAR_ROWS};

#[tokio::test]
async fn test_listGrammar_forEveryLevel_shouldOnlyReturnThatLevel() {
    let store = common::seeded_store().await;

    for level in GrammarLevel::ALL {
        let rules = store
            .grammar()
            .list_grammar(&GrammarQuery {
                level: Some(level.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(rules.iter().all(|r| r.level == level));
        let ids: Vec<i64> = rules.iter().map(|r| r.id).collect();
        assert_eq!(ids, common::grammar_ids_with_level(level.as_str()));
    }
}

#[tokio::test]
async fn test_listGrammar_byLevel_shouldIncludeB1RuleAndExcludeItFromC2() {
    let store = common::seeded_store().await;
    let repo = store.grammar();

    let b1 = repo
        .list_grammar(&GrammarQuery {
            level: Some("B1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(b1.iter().any(|r| r.id == 1 && r.super_category == "Tenses"));

    let c2 = repo
        .list_grammar(&GrammarQuery {
            level: Some("C2".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(c2.iter().all(|r| r.id != 1));
}

#[tokio::test]
async fn test_listGrammar_withNoFilters_shouldReturnWholeTableInIdOrder() {
    let store = common::seeded_store().await;
    let rules = store
        .grammar()
        .list_grammar(&GrammarQuery::default())
        .await
        .unwrap();

    let ids: Vec<i64> = rules.iter().map(|r| r.id).collect();
    let expected: Vec<i64> = GRAMMAR_ROWS.iter().map(|row| row.0).collect();
    assert_eq!(ids, expected);
    assert_eq!(rules[2].lexical_range.as_deref(), Some("wide"));
}

#[tokio::test]
async fn test_listGrammar_combinedFilters_shouldBeSubsetOfEachFilter() {
    let store = common::seeded_store().await;
    let rules = store
        .grammar()
        .list_grammar(&GrammarQuery {
            level: Some("B1".to_string()),
            super_category: Some("Tenses".to_string()),
            sub_category: Some("Present perfect".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, 1);
}

#[tokio::test]
async fn test_listGrammar_limit_shouldCapResults() {
    let store = common::seeded_store().await;
    let repo = store.grammar();

    for n in [0_i64, 1, 3, 8, 100] {
        let rules = repo
            .list_grammar(&GrammarQuery {
                limit: Some(n),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rules.len() as i64, n.min(GRAMMAR_ROWS.len() as i64));
    }
}

#[tokio::test]
async fn test_listGrammar_negativeLimit_shouldBeInvalidFilter() {
    let store = common::seeded_store().await;
    let err = store
        .grammar()
        .list_grammar(&GrammarQuery {
            limit: Some(-1),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_invalid_filter());
}

#[tokio::test]
async fn test_listGrammar_random_shouldKeepCandidateSet() {
    let store = common::seeded_store().await;
    let repo = store.grammar();

    let natural: HashSet<i64> = repo
        .list_grammar(&GrammarQuery {
            level: Some("B1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();

    for _ in 0..5 {
        let random: HashSet<i64> = repo
            .list_grammar(&GrammarQuery {
                level: Some("B1".to_string()),
                random: true,
                ..Default::default()
            })
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(random, natural);
    }

    let sample = repo
        .list_grammar(&GrammarQuery {
            random: true,
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(sample.len(), 2);
}

#[tokio::test]
async fn test_searchGrammarText_shouldMatchIffPatternInSearchFields() {
    let store = common::seeded_store().await;
    let repo = store.grammar();

    for pattern in [
        "present", "MUST", "myself", "clauses", "Relative", "xyz", "", "éclair", "ÉCLAIRS", "café",
    ] {
        let found: HashSet<i64> = repo
            .search_grammar_text(pattern, None)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();

        let needle = pattern.to_lowercase();
        let expected: HashSet<i64> = GRAMMAR_ROWS
            .iter()
            .filter(|row| {
                [row.5, row.6, row.7, row.1, row.2]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .map(|row| row.0)
            .collect();

        assert_eq!(found, expected, "pattern {:?}", pattern);
    }
}

#[tokio::test]
async fn test_searchGrammarText_shouldNotTreatPercentAsWildcard() {
    let store = common::seeded_store().await;
    let found = store
        .grammar()
        .search_grammar_text("pres%ect", None)
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_searchGrammar_withLevelAndFields_shouldNarrow() {
    let store = common::seeded_store().await;
    let search = GrammarSearch {
        fields: vec![GrammarField::Example, GrammarField::CanDoStatement],
        level: Some("a2".to_string()),
        ..GrammarSearch::new("my")
    };

    let found = store.grammar().search_grammar(&search).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, 6);
}

#[tokio::test]
async fn test_getGrammarById_shouldReturnRecordOrNone() {
    let store = common::seeded_store().await;
    let repo = store.grammar();

    let rule = repo.get_grammar_by_id(4).await.unwrap().expect("rule 4 exists");
    assert_eq!(rule.guideword, "MUST");
    assert_eq!(rule.level, GrammarLevel::B1);

    assert!(repo.get_grammar_by_id(99_999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_listGrammarPage_shouldWalkAllPages() {
    let store = common::seeded_store().await;
    let repo = store.grammar();

    let mut seen = Vec::new();
    let mut offset = 0_i64;
    loop {
        let page = repo
            .list_grammar_page(&GrammarQuery {
                limit: Some(3),
                offset: Some(offset),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, GRAMMAR_ROWS.len() as u64);
        seen.extend(page.items.iter().map(|r| r.id));
        if !page.has_more {
            break;
        }
        offset += 3;
    }

    let expected: Vec<i64> = GRAMMAR_ROWS.iter().map(|row| row.0).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_listCategories_shouldBeDistinct() {
    let store = common::seeded_store().await;
    let repo = store.grammar();

    assert_eq!(
        repo.list_super_categories().await.unwrap(),
        vec!["Clauses", "Modality", "Pronouns", "Tenses"]
    );
    assert_eq!(
        repo.list_sub_categories(Some("Modality")).await.unwrap(),
        vec!["Obligation", "Possibility"]
    );
    assert!(repo.list_sub_categories(Some(" ")).await.unwrap_err().is_invalid_filter());
}
