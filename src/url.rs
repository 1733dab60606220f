//! Project URI -> URL mapping: a fixed table of hosting-forge prefixes,
//! each gated by a minimum underscore count in the project name (to avoid
//! misreading an unrelated `foo_bar` project as belonging to a forge that
//! happens to share the `foo` prefix), falling back to GitHub.

const FORGE_PREFIXES: &[(&str, &str)] = &[
    ("bb", "bitbucket.org"),
    ("gl", "gitlab.org"),
    ("bioconductor.org", "bioconductor.org"),
    ("drupal.com", "git.drupal.org"),
    ("git.eclipse.org", "git.eclipse.org"),
    ("git.kernel.org", "git.kernel.org"),
    ("git.postgresql.org", "git.postgresql.org"),
    ("git.savannah.gnu.org", "git.savannah.gnu.org"),
    ("git.zx2c4.com", "git.zx2c4.com"),
    ("gitlab.gnome.org", "gitlab.gnome.org"),
    ("kde.org", "anongit.kde.org"),
    ("repo.or.cz", "repo.or.cz"),
    ("salsa.debian.org", "salsa.debian.org"),
    ("sourceforge.net", "git.code.sf.net/p"),
    ("android.googlesource.com", "android.googlesource.com"),
];

/// turn a project URI (e.g. `user2589_minicms`, `bb_user_repo`) into a
/// browser URL. a recognised forge prefix only applies when the project
/// name has at least two more `_`-separated segments after it (or the
/// prefix is `sourceforge.net`, which needs only one) — otherwise the URI
/// falls through to the GitHub default, first underscore becoming slash.
pub fn project_url(uri: &str) -> String {
    for (prefix, host) in FORGE_PREFIXES {
        let needle = format!("{prefix}_");
        if let Some(rest) = uri.strip_prefix(&needle) {
            let underscore_count = uri.matches('_').count();
            if underscore_count >= 2 || *prefix == "sourceforge.net" {
                return format!("https://{host}/{rest}");
            }
        }
    }
    let github_path = uri.replacen('_', "/", 1);
    format!("https://github.com/{github_path}")
}
