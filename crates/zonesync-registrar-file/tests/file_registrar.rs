use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use zonesync_core::config::RegistrarConfig;
use zonesync_core::traits::{Registrar, RegistrarFactory};
use zonesync_registrar_file::{FileRegistrar, FileRegistrarFactory};

fn domain_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn rewrite(file: &NamedTempFile, content: &str) {
    std::fs::write(file.path(), content).unwrap();
}

fn masters() -> Vec<String> {
    vec!["192.0.2.53".to_string()]
}

#[tokio::test]
async fn reads_domains_and_static_masters() {
    let file = domain_file("example.com\nexample.org\n");
    let registrar = FileRegistrar::new(file.path(), masters());

    assert_eq!(
        registrar.get_domains().await.unwrap(),
        vec!["example.com".to_string(), "example.org".to_string()]
    );
    assert_eq!(registrar.get_master_ips().await.unwrap(), masters());
    assert_eq!(registrar.get_serve_algorithm("example.com").await.unwrap(), "");
    assert!(registrar.get_tsig_key("example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn cached_list_is_served_until_refresh() {
    let file = domain_file("first.com\n");
    let registrar = FileRegistrar::new(file.path(), masters()).with_refresh(Duration::from_secs(3600));

    assert_eq!(registrar.get_domains().await.unwrap(), vec!["first.com".to_string()]);

    rewrite(&file, "second.com\n");
    assert_eq!(registrar.get_domains().await.unwrap(), vec!["first.com".to_string()]);
}

#[tokio::test]
async fn expired_cache_rereads_file() {
    let file = domain_file("first.com\n");
    let registrar = FileRegistrar::new(file.path(), masters()).with_refresh(Duration::ZERO);

    assert_eq!(registrar.get_domains().await.unwrap(), vec!["first.com".to_string()]);

    rewrite(&file, "second.com\nthird.com\n");
    assert_eq!(
        registrar.get_domains().await.unwrap(),
        vec!["second.com".to_string(), "third.com".to_string()]
    );
}

#[tokio::test]
async fn missing_file_is_a_registrar_error() {
    let dir = tempfile::tempdir().unwrap();
    let registrar = FileRegistrar::new(dir.path().join("domains.txt"), masters());

    let err = registrar.get_domains().await.unwrap_err();
    assert!(matches!(err, zonesync_core::Error::Registrar(_)));
    assert!(err.to_string().contains("domains.txt"));
}

#[tokio::test]
async fn factory_builds_from_config() {
    let file = domain_file("# managed externally\nexample.net\n");
    let config = RegistrarConfig::File {
        domains_path: file.path().to_string_lossy().into_owned(),
        master_ips: masters(),
        refresh_secs: 600,
    };

    let registrar = FileRegistrarFactory.create(&config).unwrap();

    assert_eq!(registrar.registrar_name(), "file");
    assert_eq!(registrar.get_domains().await.unwrap(), vec!["example.net".to_string()]);
}

#[tokio::test]
async fn bind_drop_yields_only_secondary_zones() {
    let file = domain_file(concat!(
        "// zone transfer drop\n",
        "acl def_xfer { 64.124.14.39; };\n",
        "zone \"a.com\" in { type slave; masters { 64.124.14.39; }; };\n",
        "zone \"b.com\" in {\n",
        "    type slave;\n",
        "    masters { 64.124.14.39; };\n",
        "};\n",
    ));
    let registrar = FileRegistrar::new(file.path(), masters());

    assert_eq!(
        registrar.get_domains().await.unwrap(),
        vec!["a.com".to_string(), "b.com".to_string()]
    );
}
