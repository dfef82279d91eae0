use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;
use vcs_core::artifacts::branch::revision::Revision;
use vcs_core::artifacts::diff::tree_diff::ChangeFilter;
use vcs_core::artifacts::history::changeset::Changeset;
use vcs_core::artifacts::nodes::{DirNode, FileNode, Node, NodeState};
use vcs_core::{ChangesetRange, Repository, Result, VcsError};

mod common;

fn branchy_repository() -> Result<Repository> {
    let repository = common::empty_repository();
    let mut staging = repository.in_memory_changeset();

    for (index, branch) in ["master", "feature", "master", "feature", "master"]
        .into_iter()
        .enumerate()
    {
        staging.stage_add([FileNode::new(&format!("file-{index}"), "x")?])?;
        staging.commit(&format!("commit {index}"), "Joe Doe <joe@example.com>", None, Some(branch), None)?;
    }

    Ok(repository)
}

fn messages(changesets: &[Arc<Changeset>]) -> Vec<&str> {
    changesets.iter().map(|cs| cs.message()).collect()
}

#[test]
fn next_and_prev_walk_the_revision_list() -> Result<()> {
    let repository = branchy_repository()?;
    let first = repository.changeset_at(0)?;

    let second = first.next(&repository, None)?;
    assert_eq!(second.revision(), 1);
    assert_eq!(second.prev(&repository, None)?, first);

    assert!(matches!(
        first.prev(&repository, None),
        Err(VcsError::NoSuchChangeset(_))
    ));
    assert!(matches!(
        repository.tip()?.next(&repository, None),
        Err(VcsError::NoSuchChangeset(_))
    ));
    Ok(())
}

#[test]
fn next_and_prev_can_stay_on_a_branch() -> Result<()> {
    let repository = branchy_repository()?;
    let first = repository.changeset_at(0)?;

    let next = first.next(&repository, Some("master"))?;
    assert_eq!(next.revision(), 2);
    assert_eq!(next.next(&repository, Some("master"))?.revision(), 4);
    assert_eq!(
        repository.tip()?.prev(&repository, Some("master"))?.revision(),
        2
    );

    let feature = repository.changeset_at(3)?;
    assert!(matches!(
        feature.next(&repository, Some("feature")),
        Err(VcsError::NoSuchChangeset(_))
    ));
    assert!(matches!(
        feature.next(&repository, Some("master")),
        Err(VcsError::BranchMismatch { .. })
    ));
    assert!(!first.is_last(&repository));
    assert!(repository.tip()?.is_last(&repository));
    Ok(())
}

#[rstest]
#[case(Revision::Tip, 4)]
#[case(Revision::parse("0"), 0)]
#[case(Revision::parse("feature"), 3)]
#[case(Revision::parse("master^"), 3)]
#[case(Revision::parse("master~2"), 2)]
#[case(Revision::parse("feature~1^"), 1)]
fn revisions_resolve_to_changesets(
    #[case] revision: Revision,
    #[case] expected: usize,
) -> Result<()> {
    let repository = branchy_repository()?;

    assert_eq!(repository.get_changeset(revision)?.revision(), expected);
    Ok(())
}

#[test]
fn ids_and_prefixes_resolve() -> Result<()> {
    let repository = branchy_repository()?;
    let changeset = repository.changeset_at(2)?;

    assert_eq!(repository.get_changeset(changeset.raw_id())?, changeset);
    assert_eq!(repository.get_changeset(changeset.short_id())?, changeset);
    assert_eq!(changeset.short_id().len(), 12);
    assert!(matches!(
        repository.get_changeset("ffffffffffffff"),
        Err(VcsError::NoSuchChangeset(_))
    ));
    assert!(matches!(
        repository.get_changeset(99_usize),
        Err(VcsError::NoSuchChangeset(_))
    ));
    Ok(())
}

#[test]
fn author_is_split_into_name_and_email() -> Result<()> {
    let repository = branchy_repository()?;
    let changeset = repository.tip()?;

    assert_eq!(changeset.author_name(), "Joe Doe");
    assert_eq!(changeset.author_email(), "joe@example.com");
    Ok(())
}

#[test]
fn walking_is_depth_first_and_restartable() -> Result<()> {
    let repository = common::two_commit_repository()?;
    let tip = repository.tip()?;

    let visit = || -> Result<Vec<(String, Vec<String>)>> {
        tip.walk("")?
            .map(|step| {
                let (dir, _, files) = step?;
                let files = files.iter().map(|f| f.name().to_string()).collect();
                Ok((dir.path().to_string(), files))
            })
            .collect()
    };

    let first = visit()?;
    assert_eq!(
        first,
        vec![
            (String::new(), vec!["foo".to_string()]),
            ("bar".to_string(), vec!["baz".to_string()]),
            ("bar/qux".to_string(), vec!["quux".to_string()]),
        ]
    );
    assert_eq!(visit()?, first);

    let nested = tip.walk("bar/qux")?.count();
    assert_eq!(nested, 1);
    assert!(matches!(tip.walk("foo"), Err(VcsError::NotADirectory(_))));
    Ok(())
}

#[test]
fn every_child_is_reachable_by_name() -> Result<()> {
    let repository = common::empty_repository();
    let files = common::random_files(3, 12);
    let pairs = files
        .iter()
        .map(|(path, content)| (path.as_str(), content.as_str()))
        .collect::<Vec<_>>();
    let changeset = common::commit_added(&repository, &pairs)?;

    for step in changeset.walk("")? {
        let (dir, _, _) = step?;
        for child in dir.nodes()? {
            assert!(!child.path().as_str().starts_with('/'));
            assert!(!child.path().as_str().is_empty());
            assert_eq!(&dir.get_node(child.name())?, child);
        }
    }
    Ok(())
}

#[test]
fn directory_children_sort_dirs_before_files() -> Result<()> {
    let repository = common::empty_repository();
    let changeset = common::commit_added(
        &repository,
        &[("b.txt", "b"), ("a/x", "x"), ("c/y", "y"), ("A.txt", "a")],
    )?;

    let names = changeset
        .root()
        .nodes()?
        .iter()
        .map(Node::name)
        .map(str::to_string)
        .collect::<Vec<_>>();

    assert_eq!(names, vec!["a", "c", "A.txt", "b.txt"]);
    Ok(())
}

#[test]
fn nodes_are_cached_per_changeset() -> Result<()> {
    let repository = common::two_commit_repository()?;
    let tip = repository.tip()?;

    let first = tip.get_node("bar/qux")?;
    let second = tip.get_node("bar/qux/")?;

    assert_eq!(first, second);
    assert!(matches!(
        tip.get_node("bar/nope"),
        Err(VcsError::NodeNotFound { .. })
    ));
    assert!(matches!(tip.get_file("bar"), Err(VcsError::NotAFile(_))));
    Ok(())
}

#[test]
fn file_states_follow_the_first_parent() -> Result<()> {
    let repository = common::two_commit_repository()?;
    let tip = repository.tip()?;
    let first = repository.changeset_at(0)?;

    assert_eq!(tip.get_file("foo")?.state(&tip)?, NodeState::Changed);
    assert_eq!(tip.get_file("bar/baz")?.state(&tip)?, NodeState::NotChanged);
    assert_eq!(first.get_file("bar/baz")?.state(&first)?, NodeState::Added);
    let root: DirNode = tip.root();
    assert_eq!(root.state(&tip), NodeState::NotChanged);
    Ok(())
}

#[test]
fn changes_can_be_filtered() -> Result<()> {
    let repository = common::two_commit_repository()?;
    let first = repository.changeset_at(0)?;

    let added = first
        .changes(ChangeFilter::ADDED)?
        .map(|(path, _)| path.clone())
        .collect::<Vec<_>>();
    assert_eq!(added, vec!["bar/baz", "bar/qux/quux", "foo"]);
    assert_eq!(first.changes(ChangeFilter::DELETED | ChangeFilter::MODIFIED)?.count(), 0);
    Ok(())
}

#[test]
fn size_sums_every_file() -> Result<()> {
    let repository = common::two_commit_repository()?;

    assert_eq!(repository.changeset_at(0)?.size()?, 4 + 4 + 5);
    assert_eq!(repository.tip()?.size()?, 13 + 4 + 5);
    Ok(())
}

#[test]
fn dict_view_serializes_for_templates() -> Result<()> {
    let repository = common::two_commit_repository()?;
    let tip = repository.tip()?;

    let dict = tip.as_dict()?;
    assert_eq!(dict.id, tip.raw_id().to_string());
    assert_eq!(dict.revision, 1);
    assert_eq!(dict.changed, vec!["foo"]);
    assert!(dict.added.is_empty() && dict.removed.is_empty());

    let json = serde_json::to_value(&dict).map_err(anyhow::Error::from)?;
    assert_eq!(json["short_id"], tip.short_id());
    assert_eq!(json["message"], "change foo");
    assert_eq!(json["date"], tip.date().to_rfc3339());
    assert!(json["author"]["email"].is_string());
    Ok(())
}

#[test]
fn changeset_ranges_cover_the_history() -> Result<()> {
    let repository = branchy_repository()?;

    let features = repository.changesets(ChangesetRange {
        branch: Some("feature".to_string()),
        ..ChangesetRange::default()
    })?;
    assert_eq!(messages(&features), vec!["commit 1", "commit 3"]);

    let tail = repository.changesets(ChangesetRange {
        start: Some(Revision::Index(3)),
        reverse: true,
        ..ChangesetRange::default()
    })?;
    assert_eq!(messages(&tail), vec!["commit 4", "commit 3"]);

    assert!(matches!(
        repository.changesets(ChangesetRange {
            branch: Some("nope".to_string()),
            ..ChangesetRange::default()
        }),
        Err(VcsError::NoSuchChangeset(_))
    ));
    Ok(())
}
