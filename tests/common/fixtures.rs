//! Shared CI config fixtures

/// One machine job with the image nested under `machine`
pub const NESTED_DEPRECATED: &str = "\
version: 2.1
jobs:
  build:
    machine:
      image: ubuntu-2204:2023.08.1
    steps:
      - checkout
      - run: make test
workflows:
  main:
    jobs:
      - build
";

/// One machine job with the image beside `machine`
pub const TOP_LEVEL_DEPRECATED: &str = "\
version: 2.1
jobs:
  mobile:
    machine: true
    image: android:2023.11.1
    steps:
      - checkout
";

/// Machine job already on a supported image
pub const CURRENT_IMAGE: &str = "\
version: 2.1
jobs:
  build:
    machine:
      image: ubuntu-2204:2024.01.1
";

/// Docker-only config
pub const DOCKER_ONLY: &str = "\
version: 2.1
jobs:
  lint:
    docker:
      - image: cimg/node:20.11
";

/// A broken machine job next to a deprecated one
pub const WITH_ANOMALY: &str = "\
version: 2.1
jobs:
  broken:
    machine: true
  build:
    machine:
      image: ubuntu-2204:2023.08.1
";

/// Deprecated job surrounded by comments, an anchor with its merge and quoting
pub const ANNOTATED_DEPRECATED: &str = "\
# Build pipeline
version: 2.1
defaults: &defaults
  working_directory: ~/repo
jobs:
  build:
    <<: *defaults
    machine:
      image: ubuntu-2204:2023.08.1 # pinned
    steps:
    - run: \"echo 'yes'\"
";

/// Deprecated image reached through an alias
pub const ALIASED_DEPRECATED: &str = "\
base: &machine_image ubuntu-2204:2023.08.1
jobs:
  build:
    machine:
      image: *machine_image
";

/// Look up a value by a dotted path in YAML text
pub fn yaml_str(content: &str, path: &[&str]) -> Option<String> {
    let value: serde_yaml::Value = serde_yaml::from_str(content).ok()?;
    let mut current = &value;
    for key in path {
        current = current.get(*key)?;
    }
    current.as_str().map(String::from)
}
