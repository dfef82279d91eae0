use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use vcs_core::areas::object_store::{LooseStore, ObjectStore};
use vcs_core::artifacts::nodes::{FileNode, Node, RemovedFileNode};
use vcs_core::artifacts::objects::object_id::ObjectId;
use vcs_core::{Repository, RepositoryConfig, Result, VcsError};

mod common;

fn loose_repository(dir: &TempDir) -> (Arc<LooseStore>, Repository) {
    common::init_tracing();
    let store = Arc::new(LooseStore::new(dir.path().join("objects")));
    let repository = Repository::new(store.clone(), RepositoryConfig::default());
    (store, repository)
}

fn subtree_id(repository: &Repository, path: &str) -> Result<Option<ObjectId>> {
    match repository.tip()?.get_node(path)? {
        Node::Dir(dir) => Ok(dir.tree_id().cloned()),
        other => Err(VcsError::NotADirectory(other.path().to_string())),
    }
}

#[test]
fn commits_are_written_as_loose_objects() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let (store, repository) = loose_repository(&dir);

    let changeset = common::commit_added(&repository, &[("a/b.txt", "b\n"), ("c.txt", "c\n")])?;

    assert!(dir.path().join("objects").join(changeset.raw_id().to_path()).is_file());
    assert!(store.contains(changeset.tree_id())?);
    assert_eq!(
        store.find_objects_by_prefix(changeset.short_id())?,
        vec![changeset.raw_id().clone()]
    );
    Ok(())
}

#[test]
fn repositories_reopen_from_disk_with_their_refs() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let (store, repository) = loose_repository(&dir);
    common::commit_added(&repository, &[("readme", "hello\n")])?;
    let tip = repository.tip()?;
    let refs = repository.refs().clone();
    drop(repository);

    let reopened = Repository::with_refs(
        Arc::new(LooseStore::new(store.objects_path())),
        RepositoryConfig::default(),
        refs,
    )?;

    let reloaded = reopened.tip()?;
    assert_eq!(reloaded.raw_id(), tip.raw_id());
    assert_eq!(reloaded.message(), tip.message());
    assert_eq!(reloaded.get_file("readme")?.text()?, "hello\n");
    assert_eq!(reopened.branches().get("master"), Some(tip.raw_id()));
    Ok(())
}

#[test]
fn refs_pointing_at_missing_objects_are_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let (_, repository) = loose_repository(&dir);
    common::commit_added(&repository, &[("readme", "hello\n")])?;
    let refs = repository.refs().clone();

    let empty = TempDir::new()?;
    let reopened = Repository::with_refs(
        Arc::new(LooseStore::new(empty.path())),
        RepositoryConfig::default(),
        refs,
    );

    assert!(matches!(reopened, Err(VcsError::NoSuchChangeset(_))));
    Ok(())
}

#[test]
fn removal_keeps_untouched_siblings() -> Result<()> {
    let repository = common::empty_repository();
    common::commit_added(
        &repository,
        &[("left/one", "1\n"), ("left/two", "2\n"), ("right/three", "3\n")],
    )?;
    let right = subtree_id(&repository, "right")?;

    let mut staging = repository.in_memory_changeset();
    staging.stage_remove([RemovedFileNode::new("left/one")?])?;
    staging.commit("drop one", "joe", None, None, None)?;

    assert_eq!(subtree_id(&repository, "right")?, right);
    assert!(matches!(
        repository.tip()?.get_node("left/one"),
        Err(VcsError::NodeNotFound { .. })
    ));
    assert_eq!(repository.tip()?.get_file("left/two")?.text()?, "2\n");
    Ok(())
}

fn file_set() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z]{1,6}", "[a-z ]{0,20}\n", 1..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sibling_subtrees_keep_their_ids(
        left in file_set(),
        right in file_set(),
        replacement in "[A-Z]{1,10}\n",
    ) {
        let repository = common::empty_repository();
        let files = left
            .iter()
            .map(|(name, content)| (format!("left/{name}"), content.clone()))
            .chain(right.iter().map(|(name, content)| (format!("right/{name}"), content.clone())))
            .collect::<Vec<_>>();
        let staged = files
            .iter()
            .map(|(path, content)| (path.as_str(), content.as_str()))
            .collect::<Vec<_>>();
        common::commit_added(&repository, &staged)?;
        let right_id = subtree_id(&repository, "right")?;
        let left_id = subtree_id(&repository, "left")?;

        let (name, _) = left.iter().next().ok_or_else(|| TestCaseError::reject("empty"))?;
        let mut staging = repository.in_memory_changeset();
        staging.stage_change([FileNode::new(&format!("left/{name}"), replacement)?])?;
        staging.commit("touch left", "joe", None, None, None)?;

        prop_assert_eq!(subtree_id(&repository, "right")?, right_id);
        prop_assert_ne!(subtree_id(&repository, "left")?, left_id);
    }

    #[test]
    fn identical_content_gives_identical_trees(files in file_set()) {
        let staged = files
            .iter()
            .map(|(path, content)| (path.as_str(), content.as_str()))
            .collect::<Vec<_>>();

        let first = common::empty_repository();
        let second = common::empty_repository();
        let one = common::commit_added(&first, &staged)?;
        let two = common::commit_added(&second, &staged)?;

        prop_assert_eq!(one.tree_id(), two.tree_id());
    }
}
