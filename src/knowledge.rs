//! Curated explanations for frequently requested topics, served when the
//! provider cannot answer. Looked up by exact name first, then by partial
//! match in either direction.

use crate::domain::Level;

/// One curated topic: `[primary, secondary, foundation and degree]`.
struct Entry {
  name: &'static str,
  tiers: [&'static str; 3],
}

const ENTRIES: &[Entry] = &[
  Entry {
    name: "react",
    tiers: [
      "React is a JavaScript library created by Facebook in 2013. It helps build websites by breaking them into reusable pieces called components. Think of it like LEGO blocks: you create small pieces and combine them to build bigger things.",
      "React uses a virtual DOM and JSX syntax to efficiently update web interfaces. Components manage state through hooks like useState and useEffect. Popular tools include Create React App, Next.js, and React Router for building single-page applications.",
      "React implements a reconciliation algorithm with fiber architecture for concurrent rendering. Advanced patterns include render props, higher-order components, context API, and custom hooks. Performance optimization uses React.memo, useMemo, and useCallback.",
    ],
  },
  Entry {
    name: "javascript",
    tiers: [
      "JavaScript is the programming language that makes websites interactive. Created by Brendan Eich in 1995, it runs in web browsers and lets you create animations, handle clicks, and update content without refreshing the page.",
      "JavaScript is an interpreted language with dynamic typing, prototypal inheritance, and first-class functions. ES6+ features include arrow functions, destructuring, modules, and async/await. Node.js enables server-side JavaScript development.",
      "JavaScript uses an event loop with call stack, callback queue, and microtask queue. Advanced concepts include closures, hoisting, prototype chain, and execution contexts. V8 engine optimizations include JIT compilation and garbage collection.",
    ],
  },
  Entry {
    name: "aws",
    tiers: [
      "Amazon Web Services (AWS) is like renting computer power from Amazon instead of buying your own servers. Launched in 2006, it offers services like storage (S3), computing (EC2), and databases that you pay for as you use.",
      "AWS provides 200+ cloud services including compute (EC2, Lambda), storage (S3, EBS), databases (RDS, DynamoDB), and networking (VPC, CloudFront). Services are deployed across global regions and availability zones for reliability.",
      "AWS architecture patterns include microservices with API Gateway, event-driven systems using EventBridge, and serverless computing with Lambda. Advanced services include EKS for Kubernetes, SageMaker for ML, and Well-Architected Framework principles.",
    ],
  },
  Entry {
    name: "docker",
    tiers: [
      "Docker is like a shipping container for software. Created by Solomon Hykes in 2013, it packages your application with everything it needs to run, so it works the same way on any computer: your laptop, servers, or the cloud.",
      "Docker uses containerization to isolate applications using Linux namespaces and cgroups. Key concepts include images, containers, Dockerfile for building, Docker Compose for multi-container apps, and registries like Docker Hub for sharing.",
      "Docker implements container runtime using containerd and runc. Advanced features include multi-stage builds, BuildKit for improved performance, Docker Swarm for orchestration, and security scanning. Integration with Kubernetes via CRI.",
    ],
  },
  Entry {
    name: "kubernetes",
    tiers: [
      "Kubernetes (K8s) is like an orchestra conductor for containers. Created by Google in 2014, it automatically manages, scales, and heals containerized applications across multiple computers, ensuring they keep running smoothly.",
      "Kubernetes orchestrates containers using pods, services, deployments, and ingress controllers. Key features include auto-scaling, rolling updates, service discovery, and persistent storage. kubectl is the command-line tool for cluster management.",
      "Kubernetes uses etcd for cluster state, kube-scheduler for pod placement, and kubelet for node management. Advanced concepts include custom resources, operators, admission controllers, and network policies using CNI plugins like Calico.",
    ],
  },
  Entry {
    name: "cryptocurrency",
    tiers: [
      "Cryptocurrency is digital money stored on computers. Like Bitcoin, you can send it directly to others without using banks. It uses special math codes to keep transactions secure and prevent counterfeiting.",
      "Cryptocurrency operates on blockchain networks using cryptographic algorithms. Miners validate transactions through proof-of-work consensus, creating immutable ledgers that eliminate intermediaries while maintaining decentralized control.",
      "Cryptocurrency leverages distributed ledger technology with cryptographic hash functions, merkle trees, and consensus mechanisms like PoW/PoS to achieve Byzantine fault tolerance in trustless peer-to-peer value transfer systems.",
    ],
  },
  Entry {
    name: "machine learning",
    tiers: [
      "Machine learning teaches computers to recognize patterns by showing them lots of examples. Like teaching a child to recognize cats by showing many cat pictures, computers learn to make predictions.",
      "Machine learning uses statistical algorithms to find patterns in data. Neural networks, decision trees, and regression models train on datasets to make predictions without explicit programming for each scenario.",
      "Machine learning employs gradient descent optimization, backpropagation, and regularization techniques across supervised, unsupervised, and reinforcement learning paradigms to minimize loss functions and generalize from training data.",
    ],
  },
  Entry {
    name: "python",
    tiers: [
      "Python is a programming language that's easy to read and write. It uses simple English-like commands to tell computers what to do, making it perfect for beginners to learn coding.",
      "Python is an interpreted, high-level language with dynamic typing and automatic memory management. Its extensive standard library and frameworks like Django make it versatile for web development, data science, and automation.",
      "Python implements duck typing with a global interpreter lock (GIL), uses reference counting with cycle detection for garbage collection, and supports metaclasses, decorators, and context managers for advanced programming patterns.",
    ],
  },
  Entry {
    name: "quantum computing",
    tiers: [
      "Quantum computers use tiny particles that can be in multiple states at once, unlike regular computers that use just 0s and 1s. This lets them solve certain problems much faster.",
      "Quantum computing exploits quantum superposition and entanglement to process information. Qubits can exist in multiple states simultaneously, enabling parallel computation through quantum algorithms like Shor's and Grover's.",
      "Quantum computing utilizes quantum mechanical phenomena including superposition, entanglement, and quantum interference. Gate-based quantum circuits manipulate qubit states through unitary operations to achieve quantum speedup for specific computational problems.",
    ],
  },
  Entry {
    name: "blockchain",
    tiers: [
      "Blockchain is like a digital ledger that everyone can see but no one can cheat. Each new transaction gets added as a 'block' and linked to previous blocks, creating an unchangeable chain.",
      "Blockchain creates immutable distributed ledgers through cryptographic hashing and consensus mechanisms. Each block contains transaction data, timestamps, and hash pointers, forming a tamper-evident chain validated by network participants.",
      "Blockchain implements cryptographic hash functions, merkle trees, and distributed consensus protocols (PoW, PoS, PBFT) to achieve Byzantine fault tolerance in decentralized systems while maintaining data integrity and preventing double-spending attacks.",
    ],
  },
];

// Shorter queries are too ambiguous to match inside a topic name.
const MIN_PARTIAL_CHARS: usize = 3;

fn tier(level: Level) -> usize {
  match level {
    Level::Primary => 0,
    Level::Secondary => 1,
    Level::Foundation | Level::Degree => 2,
  }
}

fn contains_words(haystack: &str, needle: &str) -> bool {
  let hay: Vec<&str> = haystack.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();
  let need: Vec<&str> = needle.split(' ').collect();
  hay.windows(need.len()).any(|w| w == need.as_slice())
}

fn find(topic: &str) -> Option<&'static Entry> {
  let key = topic.trim().to_lowercase();
  if key.is_empty() {
    return None;
  }
  ENTRIES.iter().find(|e| e.name == key).or_else(|| {
    ENTRIES
      .iter()
      .find(|e| contains_words(&key, e.name) || (key.len() >= MIN_PARTIAL_CHARS && e.name.contains(key.as_str())))
  })
}

/// Curated explanation of `topic` at `level`, if the topic is known.
pub fn lookup(topic: &str, level: Level) -> Option<&'static str> {
  find(topic).map(|e| e.tiers[tier(level)])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn direct_match_picks_the_level_tier() {
    let text = lookup("Docker", Level::Primary).unwrap();
    assert!(text.starts_with("Docker is like a shipping container"));
    assert!(lookup(" python ", Level::Secondary).unwrap().starts_with("Python is an interpreted"));
    assert_eq!(lookup("kubernetes", Level::Degree), lookup("kubernetes", Level::Foundation));
  }

  #[test]
  fn partial_match_in_either_direction() {
    // Known name inside the query.
    assert!(lookup("Intro to React hooks", Level::Primary).unwrap().starts_with("React is a JavaScript library"));
    assert!(lookup("applied machine learning", Level::Secondary).unwrap().starts_with("Machine learning uses"));
    // Query inside a known name.
    assert!(lookup("quantum", Level::Primary).unwrap().starts_with("Quantum computers"));
  }

  #[test]
  fn unrelated_or_tiny_queries_miss() {
    assert_eq!(lookup("Photosynthesis", Level::Primary), None);
    assert_eq!(lookup("a", Level::Primary), None);
    assert_eq!(lookup("Reactions in chemistry", Level::Primary), None);
    assert_eq!(lookup("", Level::Primary), None);
  }
}
