mod support;

use persistence_context::{
    CascadeError, CascadeType, Entity, EntityHandle, EntityState, OperationCascader, Value,
};
use support::{context, model, models, TestContext};

struct Graph {
    article: EntityHandle,
    author: EntityHandle,
    comments: Vec<EntityHandle>,
}

fn new_graph(ctx: &mut TestContext) -> Graph {
    let author = ctx.insert_entity(Entity::new("User").with("name", "Ada"));
    let first = ctx.insert_entity(Entity::new("Comment").with("body", "first"));
    let second = ctx.insert_entity(Entity::new("Comment").with("body", "second"));
    let article = ctx.insert_entity(
        Entity::new("Article")
            .with("title", "Hello")
            .with("author", author)
            .with("comments", vec![first, second]),
    );
    for comment in [first, second] {
        ctx.entity_mut(comment).unwrap().set("article", article);
    }
    Graph {
        article,
        author,
        comments: vec![first, second],
    }
}

#[test]
fn persist_pass_reaches_the_cascading_graph() {
    let models = models();
    let mut ctx = context();
    let graph = new_graph(&mut ctx);

    let mut reached = Vec::new();
    let mut collect = |entity: EntityHandle| {
        reached.push(entity);
        Ok::<(), CascadeError>(())
    };
    let mut cascader = OperationCascader::new(CascadeType::Persist);
    cascader
        .cascade_graph(&ctx, &models, graph.article, &mut collect)
        .unwrap();

    assert_eq!(
        reached,
        vec![
            graph.article,
            graph.author,
            graph.comments[0],
            graph.comments[1]
        ]
    );

    for entity in reached {
        let info = ctx.classify(entity, &models).unwrap();
        assert_eq!(info.state(), EntityState::New);
        ctx.manage_entity(entity, info.model().clone()).unwrap();
    }
    assert_eq!(ctx.managed_entities().count(), 4);
}

#[test]
fn merge_pass_skips_relations_without_merge() {
    let models = models();
    let mut ctx = context();
    let graph = new_graph(&mut ctx);

    let mut reached = Vec::new();
    let mut collect = |entity: EntityHandle| {
        reached.push(entity);
        Ok::<(), CascadeError>(())
    };
    OperationCascader::new(CascadeType::Merge)
        .cascade_graph(&ctx, &models, graph.article, &mut collect)
        .unwrap();

    assert!(!reached.contains(&graph.author));
    assert_eq!(reached.len(), 3);
}

#[test]
fn managed_entities_cascade_through_their_ledger_model() {
    let models = models();
    let article_model = model(&models, "Article");
    let user_model = model(&models, "User");
    let mut ctx = context();

    let article = ctx
        .create_managed_entity(&article_model, &Value::Int(7))
        .unwrap();
    let author = ctx
        .create_managed_entity(&user_model, &Value::Int(1))
        .unwrap();
    ctx.entity_mut(article).unwrap().set("author", author);

    let mut to_remove = Vec::new();
    let mut collect = |entity: EntityHandle| {
        to_remove.push(entity);
        Ok::<(), CascadeError>(())
    };
    OperationCascader::new(CascadeType::Remove)
        .cascade_graph(&ctx, &models, article, &mut collect)
        .unwrap();

    for entity in to_remove {
        ctx.remove_entity(entity).unwrap();
    }
    assert!(ctx.contains_removed_entity(article));
    assert!(ctx.contains_removed_entity(author));
}

#[test]
fn shared_references_are_applied_once() {
    let models = models();
    let mut ctx = context();
    let comment = ctx.insert_entity(Entity::new("Comment"));
    let article = ctx.insert_entity(Entity::new("Article").with("comments", vec![comment, comment]));

    let mut count = 0;
    let mut counter = |_: EntityHandle| {
        count += 1;
        Ok::<(), CascadeError>(())
    };
    let mut cascader = OperationCascader::new(CascadeType::Persist);
    cascader
        .cascade_graph(&ctx, &models, article, &mut counter)
        .unwrap();
    // a second pass through the same cascader is a no-op
    cascader
        .cascade_graph(&ctx, &models, article, &mut counter)
        .unwrap();

    assert_eq!(count, 2);
    assert!(cascader.is_cascaded(comment));
}

#[test]
fn failure_identifies_the_relation() {
    let models = models();
    let mut ctx = context();
    let graph = new_graph(&mut ctx);
    let failing = graph.comments[1];

    let mut persist = |entity: EntityHandle| {
        if entity == failing {
            return Err(CascadeError::operation("comment rejected"));
        }
        Ok(())
    };
    let err = OperationCascader::new(CascadeType::Persist)
        .cascade_graph(&ctx, &models, graph.article, &mut persist)
        .unwrap_err();

    assert_eq!(err.property_path(), vec!["Article::comments"]);
    assert_eq!(
        err.to_string(),
        "failed to cascade PERSIST to property Article::comments"
    );
    assert_eq!(err.root_cause().to_string(), "comment rejected");
}

#[test]
fn cascade_properties_walks_one_level() {
    let models = models();
    let article_model = model(&models, "Article");
    let mut ctx = context();
    let graph = new_graph(&mut ctx);

    let mut reached = Vec::new();
    let mut collect = |entity: EntityHandle| {
        reached.push(entity);
        Ok::<(), CascadeError>(())
    };
    OperationCascader::new(CascadeType::Remove)
        .cascade_properties(
            &article_model,
            ctx.entity(graph.article).unwrap(),
            &mut collect,
        )
        .unwrap();

    assert_eq!(
        reached,
        vec![graph.author, graph.comments[0], graph.comments[1]]
    );
}
