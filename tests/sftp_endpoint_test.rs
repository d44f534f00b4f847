// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The SFTP endpoint against an in-process SFTP server.
//!
//! The server runs over an in-memory duplex stream and serves a temporary
//! directory as `/`, with `/home/alice` as the login directory. No SSH
//! session is involved; the SFTP sub-session is driven exactly as it is
//! over a real channel.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nodecp::copy::{
    paths, resolve_source, resolve_target, transfer, CopyError, Endpoint, EntryKind, HomeKind,
    LocalEndpoint, RemoteEndpoint, Side, TransferMode, TransferSummary,
};
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::{
    Attrs, Data, File, FileAttributes, Handle, Name, OpenFlags, Status, StatusCode,
};
use tempfile::TempDir;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

const HOME: &str = "/home/alice";

enum OpenHandle {
    File(fs::File),
    /// Listing not yet sent; `None` once it has been.
    Dir(Option<Vec<File>>),
}

/// Serves `root` as the filesystem root of an SFTP server.
struct TempDirSftp {
    root: PathBuf,
    handles: Arc<Mutex<HashMap<String, OpenHandle>>>,
    handle_counter: u64,
}

impl TempDirSftp {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            handles: Arc::new(Mutex::new(HashMap::new())),
            handle_counter: 0,
        }
    }

    /// Virtual path as the client sees it and the real path below `root`.
    fn resolve(&self, path: &str) -> (String, PathBuf) {
        let virtual_path = if path.starts_with('/') {
            paths::clean(path)
        } else {
            paths::join(HOME, path)
        };
        let real = self.root.join(virtual_path.trim_start_matches('/'));
        (virtual_path, real)
    }

    fn new_handle(&mut self) -> String {
        self.handle_counter += 1;
        format!("handle-{}", self.handle_counter)
    }
}

fn status_of(err: io::Error) -> StatusCode {
    match err.kind() {
        io::ErrorKind::NotFound => StatusCode::NoSuchFile,
        io::ErrorKind::PermissionDenied => StatusCode::PermissionDenied,
        _ => StatusCode::Failure,
    }
}

fn ok(id: u32) -> Status {
    Status {
        id,
        status_code: StatusCode::Ok,
        error_message: String::new(),
        language_tag: "en".to_string(),
    }
}

impl russh_sftp::server::Handler for TempDirSftp {
    type Error = StatusCode;

    fn unimplemented(&self) -> Self::Error {
        StatusCode::OpUnsupported
    }

    fn open(
        &mut self,
        id: u32,
        filename: String,
        pflags: OpenFlags,
        _attrs: FileAttributes,
    ) -> impl Future<Output = Result<Handle, Self::Error>> + Send {
        let (_, path) = self.resolve(&filename);
        let handle = self.new_handle();
        let handles = Arc::clone(&self.handles);

        async move {
            let file = fs::OpenOptions::new()
                .read(pflags.contains(OpenFlags::READ))
                .write(pflags.contains(OpenFlags::WRITE))
                .create(pflags.contains(OpenFlags::CREATE))
                .truncate(pflags.contains(OpenFlags::TRUNCATE))
                .open(&path)
                .await
                .map_err(status_of)?;

            handles
                .lock()
                .await
                .insert(handle.clone(), OpenHandle::File(file));
            Ok(Handle { id, handle })
        }
    }

    fn read(
        &mut self,
        id: u32,
        handle: String,
        offset: u64,
        len: u32,
    ) -> impl Future<Output = Result<Data, Self::Error>> + Send {
        let handles = Arc::clone(&self.handles);

        async move {
            let mut handles = handles.lock().await;
            let Some(OpenHandle::File(file)) = handles.get_mut(&handle) else {
                return Err(StatusCode::Failure);
            };

            file.seek(SeekFrom::Start(offset)).await.map_err(status_of)?;
            let mut data = vec![0u8; len as usize];
            let read = file.read(&mut data).await.map_err(status_of)?;
            if read == 0 {
                return Err(StatusCode::Eof);
            }
            data.truncate(read);
            Ok(Data { id, data })
        }
    }

    fn write(
        &mut self,
        id: u32,
        handle: String,
        offset: u64,
        data: Vec<u8>,
    ) -> impl Future<Output = Result<Status, Self::Error>> + Send {
        let handles = Arc::clone(&self.handles);

        async move {
            let mut handles = handles.lock().await;
            let Some(OpenHandle::File(file)) = handles.get_mut(&handle) else {
                return Err(StatusCode::Failure);
            };

            file.seek(SeekFrom::Start(offset)).await.map_err(status_of)?;
            file.write_all(&data).await.map_err(status_of)?;
            Ok(ok(id))
        }
    }

    fn close(
        &mut self,
        id: u32,
        handle: String,
    ) -> impl Future<Output = Result<Status, Self::Error>> + Send {
        let handles = Arc::clone(&self.handles);

        async move {
            match handles.lock().await.remove(&handle) {
                Some(OpenHandle::File(mut file)) => {
                    file.flush().await.map_err(status_of)?;
                    Ok(ok(id))
                }
                Some(OpenHandle::Dir(_)) => Ok(ok(id)),
                None => Err(StatusCode::Failure),
            }
        }
    }

    fn opendir(
        &mut self,
        id: u32,
        path: String,
    ) -> impl Future<Output = Result<Handle, Self::Error>> + Send {
        let (_, path) = self.resolve(&path);
        let handle = self.new_handle();
        let handles = Arc::clone(&self.handles);

        async move {
            let mut listing = Vec::new();
            let mut read_dir = fs::read_dir(&path).await.map_err(status_of)?;
            while let Some(entry) = read_dir.next_entry().await.map_err(status_of)? {
                let metadata = entry.metadata().await.map_err(status_of)?;
                listing.push(File {
                    filename: entry.file_name().to_string_lossy().into_owned(),
                    longname: String::new(),
                    attrs: FileAttributes::from(&metadata),
                });
            }

            handles
                .lock()
                .await
                .insert(handle.clone(), OpenHandle::Dir(Some(listing)));
            Ok(Handle { id, handle })
        }
    }

    fn readdir(
        &mut self,
        id: u32,
        handle: String,
    ) -> impl Future<Output = Result<Name, Self::Error>> + Send {
        let handles = Arc::clone(&self.handles);

        async move {
            let mut handles = handles.lock().await;
            match handles.get_mut(&handle) {
                Some(OpenHandle::Dir(listing)) => match listing.take() {
                    Some(files) => Ok(Name { id, files }),
                    None => Err(StatusCode::Eof),
                },
                _ => Err(StatusCode::Failure),
            }
        }
    }

    fn stat(
        &mut self,
        id: u32,
        path: String,
    ) -> impl Future<Output = Result<Attrs, Self::Error>> + Send {
        let (_, path) = self.resolve(&path);

        async move {
            let metadata = fs::metadata(&path).await.map_err(status_of)?;
            Ok(Attrs {
                id,
                attrs: FileAttributes::from(&metadata),
            })
        }
    }

    fn realpath(
        &mut self,
        id: u32,
        path: String,
    ) -> impl Future<Output = Result<Name, Self::Error>> + Send {
        let (virtual_path, _) = self.resolve(&path);

        async move {
            Ok(Name {
                id,
                files: vec![File {
                    filename: virtual_path,
                    longname: String::new(),
                    attrs: FileAttributes::default(),
                }],
            })
        }
    }

    fn mkdir(
        &mut self,
        id: u32,
        path: String,
        _attrs: FileAttributes,
    ) -> impl Future<Output = Result<Status, Self::Error>> + Send {
        let (_, path) = self.resolve(&path);

        async move {
            fs::create_dir(&path).await.map_err(status_of)?;
            Ok(ok(id))
        }
    }

    fn rmdir(
        &mut self,
        id: u32,
        path: String,
    ) -> impl Future<Output = Result<Status, Self::Error>> + Send {
        let (_, path) = self.resolve(&path);

        async move {
            fs::remove_dir(&path).await.map_err(status_of)?;
            Ok(ok(id))
        }
    }

    fn remove(
        &mut self,
        id: u32,
        filename: String,
    ) -> impl Future<Output = Result<Status, Self::Error>> + Send {
        let (_, path) = self.resolve(&filename);

        async move {
            fs::remove_file(&path).await.map_err(status_of)?;
            Ok(ok(id))
        }
    }
}

/// A host directory plus a node served over SFTP.
struct Fixture {
    _host_dir: TempDir,
    _node_dir: TempDir,
    host_home: PathBuf,
    node_home: PathBuf,
    host: LocalEndpoint,
    sftp: SftpSession,
}

impl Fixture {
    async fn new() -> Self {
        let host_dir = TempDir::new().unwrap();
        let node_dir = TempDir::new().unwrap();
        let host_home = host_dir.path().to_path_buf();
        let node_home = node_dir.path().join("home").join("alice");
        std::fs::create_dir_all(&node_home).unwrap();

        let (client_stream, server_stream) = tokio::io::duplex(1 << 20);
        russh_sftp::server::run(server_stream, TempDirSftp::new(node_dir.path())).await;
        let sftp = SftpSession::new(client_stream).await.unwrap();

        Self {
            host: LocalEndpoint::with_home(&host_home),
            host_home,
            node_home,
            sftp,
            _host_dir: host_dir,
            _node_dir: node_dir,
        }
    }

    fn remote(&self) -> RemoteEndpoint<'_> {
        RemoteEndpoint::new(&self.sftp)
    }
}

async fn run(
    source_endpoint: &dyn Endpoint,
    source: &str,
    target_endpoint: &dyn Endpoint,
    target: &str,
    mode: TransferMode,
) -> Result<TransferSummary, CopyError> {
    let source = resolve_source(source_endpoint, source).await?;
    let target = resolve_target(target_endpoint, target).await?;
    transfer(source_endpoint, &source, target_endpoint, &target, mode).await
}

#[tokio::test]
async fn test_remote_home_is_classified_once() {
    let fx = Fixture::new().await;
    let remote = fx.remote();

    let home = remote.home().await.unwrap();
    assert_eq!(home.kind(), HomeKind::Posix);
    assert_eq!(home.path(), HOME);
    assert_eq!(remote.home_dir().await.unwrap(), HOME);
}

#[tokio::test]
async fn test_push_file_into_remote_home() {
    let fx = Fixture::new().await;
    std::fs::write(fx.host_home.join("report.txt"), b"quarterly numbers").unwrap();
    let remote = fx.remote();

    let summary = run(
        &fx.host,
        "~/report.txt",
        &remote,
        "~/",
        TransferMode::Copy,
    )
    .await
    .unwrap();

    assert_eq!(summary.files, 1);
    assert_eq!(summary.bytes, 17);
    assert_eq!(
        std::fs::read(fx.node_home.join("report.txt")).unwrap(),
        b"quarterly numbers"
    );
    assert!(fx.host_home.join("report.txt").exists());
}

#[tokio::test]
async fn test_push_overwrites_longer_remote_file() {
    let fx = Fixture::new().await;
    std::fs::write(fx.host_home.join("notes.txt"), b"short").unwrap();
    std::fs::write(fx.node_home.join("notes.txt"), b"a much longer previous version").unwrap();
    let remote = fx.remote();

    run(
        &fx.host,
        "~/notes.txt",
        &remote,
        "~/notes.txt",
        TransferMode::Copy,
    )
    .await
    .unwrap();

    assert_eq!(std::fs::read(fx.node_home.join("notes.txt")).unwrap(), b"short");
}

#[tokio::test]
async fn test_push_tree_onto_missing_remote_target() {
    let fx = Fixture::new().await;
    let build = fx.host_home.join("build");
    std::fs::create_dir_all(build.join("sub")).unwrap();
    std::fs::write(build.join("a.txt"), b"aa").unwrap();
    std::fs::write(build.join("sub").join("b.txt"), b"bbb").unwrap();
    let remote = fx.remote();

    let summary = run(&fx.host, "~/build", &remote, "~/deploy", TransferMode::Copy)
        .await
        .unwrap();

    assert_eq!(
        summary,
        TransferSummary {
            files: 2,
            directories: 2,
            bytes: 5,
        }
    );
    let deploy = fx.node_home.join("deploy");
    assert_eq!(std::fs::read(deploy.join("a.txt")).unwrap(), b"aa");
    assert_eq!(std::fs::read(deploy.join("sub").join("b.txt")).unwrap(), b"bbb");
}

#[tokio::test]
async fn test_pull_nested_tree_into_host_directory() {
    let fx = Fixture::new().await;
    let build = fx.node_home.join("build");
    std::fs::create_dir_all(build.join("sub").join("deeper")).unwrap();
    std::fs::write(build.join("a.txt"), b"a").unwrap();
    std::fs::write(build.join("sub").join("deeper").join("c.txt"), b"ccc").unwrap();
    std::fs::create_dir(fx.host_home.join("out")).unwrap();
    let remote = fx.remote();

    let summary = run(&remote, "~/build/", &fx.host, "~/out", TransferMode::Copy)
        .await
        .unwrap();

    assert_eq!(summary.files, 2);
    assert_eq!(summary.directories, 3);
    let pulled = fx.host_home.join("out").join("build");
    assert_eq!(std::fs::read(pulled.join("a.txt")).unwrap(), b"a");
    assert_eq!(
        std::fs::read(pulled.join("sub").join("deeper").join("c.txt")).unwrap(),
        b"ccc"
    );
    assert!(build.join("a.txt").exists());
}

#[tokio::test]
async fn test_remote_walk_is_pre_order() {
    let fx = Fixture::new().await;
    let tree = fx.node_home.join("tree");
    std::fs::create_dir_all(tree.join("x").join("y")).unwrap();
    std::fs::write(tree.join("x").join("y").join("z.txt"), b"z").unwrap();
    std::fs::write(tree.join("top.txt"), b"t").unwrap();
    let remote = fx.remote();

    let mut walk = remote.walk("/home/alice/tree").await.unwrap();
    let mut relative = Vec::new();
    while let Some(entry) = walk.next_entry().await.unwrap() {
        if entry.relative.is_empty() {
            assert_eq!(entry.kind, EntryKind::Directory);
            assert_eq!(entry.path, "/home/alice/tree");
        }
        relative.push(entry.relative_path());
    }

    assert_eq!(relative[0], "");
    assert_eq!(relative.len(), 5);
    let x = relative.iter().position(|r| r == "x").unwrap();
    let y = relative.iter().position(|r| r == "x/y").unwrap();
    let z = relative.iter().position(|r| r == "x/y/z.txt").unwrap();
    assert!(x < y && y < z);
    assert!(relative.contains(&"top.txt".to_string()));
}

#[tokio::test]
async fn test_move_remote_directory_deletes_it_after_copy() {
    let fx = Fixture::new().await;
    let logs = fx.node_home.join("logs");
    std::fs::create_dir_all(logs.join("old")).unwrap();
    std::fs::write(logs.join("x.log"), b"x").unwrap();
    std::fs::write(logs.join("old").join("y.log"), b"yy").unwrap();
    let remote = fx.remote();

    let summary = run(&remote, "~/logs", &fx.host, "~/", TransferMode::Move)
        .await
        .unwrap();

    assert_eq!(summary.files, 2);
    assert!(!logs.exists());
    let moved = fx.host_home.join("logs");
    assert_eq!(std::fs::read(moved.join("x.log")).unwrap(), b"x");
    assert_eq!(std::fs::read(moved.join("old").join("y.log")).unwrap(), b"yy");
}

#[tokio::test]
async fn test_move_file_to_remote_removes_host_copy() {
    let fx = Fixture::new().await;
    std::fs::write(fx.host_home.join("data.bin"), vec![3u8; 4096]).unwrap();
    let remote = fx.remote();

    run(&fx.host, "~/data.bin", &remote, "~/", TransferMode::Move)
        .await
        .unwrap();

    assert!(!fx.host_home.join("data.bin").exists());
    assert_eq!(
        std::fs::read(fx.node_home.join("data.bin")).unwrap(),
        vec![3u8; 4096]
    );
}

#[tokio::test]
async fn test_mkdir_all_creates_every_missing_level() {
    let fx = Fixture::new().await;
    let remote = fx.remote();

    remote.mkdir_all("/home/alice/a/b/c").await.unwrap();
    assert!(fx.node_home.join("a").join("b").join("c").is_dir());

    // Existing directories are fine.
    remote.mkdir_all("/home/alice/a/b").await.unwrap();
    assert_eq!(
        remote.stat("/home/alice/a/b/c").await.unwrap(),
        Some(EntryKind::Directory)
    );
}

#[tokio::test]
async fn test_mkdir_all_refuses_to_descend_through_a_file() {
    let fx = Fixture::new().await;
    std::fs::write(fx.node_home.join("plain"), b"p").unwrap();
    let remote = fx.remote();

    let err = remote.mkdir_all("/home/alice/plain/sub").await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_missing_remote_paths_map_to_not_found() {
    let fx = Fixture::new().await;
    let remote = fx.remote();

    assert_eq!(remote.stat("/home/alice/nope").await.unwrap(), None);

    let err = match remote.open("/home/alice/nope").await {
        Ok(_) => panic!("opening a missing remote file must fail"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), io::ErrorKind::NotFound);

    let err = resolve_source(&remote, "~/nope").await.unwrap_err();
    assert!(matches!(
        err,
        CopyError::NotFound { side: Side::Remote, ref path } if path == "/home/alice/nope"
    ));

    let err = resolve_target(&remote, "~/missing/dir/file.txt")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CopyError::InvalidTarget { side: Side::Remote, ref parent, .. } if parent == "/home/alice/missing/dir"
    ));
}

#[tokio::test]
async fn test_remote_directory_onto_host_file_fails() {
    let fx = Fixture::new().await;
    std::fs::create_dir(fx.node_home.join("build")).unwrap();
    std::fs::write(fx.host_home.join("build.txt"), b"keep").unwrap();
    let remote = fx.remote();

    let err = run(&remote, "~/build", &fx.host, "~/build.txt", TransferMode::Move)
        .await
        .unwrap_err();

    assert!(matches!(err, CopyError::TargetIsFile { side: Side::Local, .. }));
    assert!(fx.node_home.join("build").exists());
    assert_eq!(std::fs::read(fx.host_home.join("build.txt")).unwrap(), b"keep");
}
