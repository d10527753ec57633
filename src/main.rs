use clap::{Parser, Subcommand};
use photo_report::imaging::RustBackend;
use photo_report::metadata::{self, ProjectMetadata};
use photo_report::pipeline::{self, ReportRequest};
use photo_report::scratch::ImageStore;
use photo_report::types::FlatItem;
use photo_report::{config, organize, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "photo-report")]
#[command(about = "Site-survey photo archive to Word report generator")]
#[command(long_about = "\
Site-survey photo archive to Word report generator

The archive's folder tree is the report outline. Folders become headings,
photos become embedded images, and project metadata fills the template's
{{placeholders}}.

Archive structure:

  survey.zip
  └── Agência Centro/              # Single enclosing folder is skipped
      ├── - Área externa/          # Heading 1 (priority order, then A-Z)
      │   ├── fachada.jpg          # Images in capture order
      │   └── Telhado/             # Heading 2
      │       └── calha.png
      └── - Detalhes/              # Bold body text instead of a heading
          └── quadro.JPG

Layout:
  Narrow photos (≤ 7.5 cm at 96 dpi) share a borderless table row, up to 3.
  Other photos stand alone, 10 cm tall. Each folder's photos end with a page break.
  Content goes where the template says {{start_here}}, or at the end.

Run 'photo-report gen-config' to generate a documented report.toml.")]
#[command(version)]
struct Cli {
    /// Report configuration file (stock defaults when absent)
    #[arg(long, default_value = "report.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the Content Sequence of an archive
    Organize {
        archive: PathBuf,
        /// Print the sequence as JSON
        #[arg(long, conflicts_with = "flat")]
        json: bool,
        /// Print an editable flat listing as JSON (input for `build --order`)
        #[arg(long)]
        flat: bool,
    },
    /// Print the preview folder tree, generating a thumbnail per photo
    Preview {
        archive: PathBuf,
        /// Copy the generated thumbnails into this directory
        #[arg(long)]
        thumbnails: Option<PathBuf>,
        /// Project name shown as the tree title
        #[arg(long, default_value = "")]
        project: String,
    },
    /// Run the full pipeline: organize → (reorder) → compose
    Build {
        archive: PathBuf,
        /// Template id from the registry, or a path to a .docx
        #[arg(long)]
        template: String,
        /// Project metadata (.toml or .json)
        #[arg(long)]
        metadata: PathBuf,
        /// Flat listing (JSON) overriding the archive's order
        #[arg(long)]
        order: Option<PathBuf>,
        /// Output file, or directory for the default report name
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
    /// List the registered templates
    Templates,
    /// List the recognised state codes
    States,
    /// Print a stock report.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Organize {
            archive,
            json,
            flat,
        } => {
            let config = config::load_config(&cli.config)?;
            if flat {
                let items = organize::listing(&archive, &config)?;
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                let store = ImageStore::new(config.scratch_root.as_deref())?;
                let sequence = organize::organize(&archive, &store, &config)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&sequence)?);
                } else {
                    output::print_sequence(&sequence);
                }
            }
        }
        Command::Preview {
            archive,
            thumbnails,
            project,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let store = ImageStore::new(config.scratch_root.as_deref())?;
            let mut tree =
                organize::preview(&archive, &store, &RustBackend::new(), &config, &project)?;
            if let Some(dir) = thumbnails {
                keep_thumbnails(&mut tree.folders, &dir)?;
            }
            output::print_tree(&tree);
        }
        Command::Build {
            archive,
            template,
            metadata: metadata_path,
            order,
            output: output_path,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let metadata: ProjectMetadata = metadata::load_metadata(&metadata_path)?;
            let order: Option<Vec<FlatItem>> = match order {
                Some(path) => Some(serde_json::from_str(&std::fs::read_to_string(path)?)?),
                None => None,
            };
            let request = ReportRequest {
                archive,
                template: config.templates.resolve(&template),
                metadata,
                order,
                output: output_path,
            };
            let outcome = pipeline::generate_report(&RustBackend::new(), &request, &config)?;
            output::print_report(&outcome);
        }
        Command::Templates => {
            let config = config::load_config(&cli.config)?;
            output::print_templates(&config.templates);
        }
        Command::States => {
            output::print_states();
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Copy thumbnails out of the scratch store (removed on exit) and repoint
/// the tree at the copies.
fn keep_thumbnails(
    folders: &mut [photo_report::types::FolderNode],
    dir: &Path,
) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for folder in folders {
        for image in &mut folder.images {
            if let Some(thumb) = image.thumbnail_path.as_mut() {
                if let Some(name) = thumb.file_name() {
                    let target = dir.join(name);
                    std::fs::copy(&*thumb, &target)?;
                    *thumb = target;
                }
            }
        }
        keep_thumbnails(&mut folder.children, dir)?;
    }
    Ok(())
}
