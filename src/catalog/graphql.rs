//! GraphQL documents for the remote catalog, one constant per operation.
//! Variables and response payloads live with the client in `remote.rs`.

pub const CREATE_COMPONENT: &str = r"
mutation createComponent($cloudId: ID!, $componentDetails: CreateCompassComponentInput!) {
  compass {
    createComponent(cloudId: $cloudId, input: $componentDetails) {
      success
      componentDetails {
        id
        links {
          id
          type
          name
          url
        }
      }
      errors {
        message
      }
    }
  }
}";

pub const UPDATE_COMPONENT: &str = r"
mutation updateComponent($componentDetails: UpdateCompassComponentInput!) {
  compass {
    updateComponent(input: $componentDetails) {
      success
      componentDetails {
        id
        links {
          id
          type
          name
          url
        }
      }
      errors {
        message
      }
    }
  }
}";

pub const DELETE_COMPONENT: &str = r"
mutation deleteComponent($id: ID!) {
  compass {
    deleteComponent(input: { id: $id }) {
      success
      errors {
        message
      }
    }
  }
}";

pub const GET_COMPONENT_BY_SLUG: &str = r"
query getComponentBySlug($cloudId: ID!, $slug: String!) {
  compass {
    componentByReference(reference: { slug: { slug: $slug, cloudId: $cloudId } }) {
      ... on CompassComponent {
        id
        links {
          id
          name
          type
          url
        }
      }
    }
  }
}";

pub const CREATE_METRIC: &str = r"
mutation createMetricDefinition($cloudId: ID!, $name: String!, $description: String!, $unit: String!) {
  compass {
    createMetricDefinition(
      input: {
        cloudId: $cloudId
        name: $name
        description: $description
        format: { suffix: { suffix: $unit } }
      }
    ) {
      success
      createdMetricDefinition {
        id
      }
      errors {
        message
      }
    }
  }
}";

pub const UPDATE_METRIC: &str = r"
mutation updateMetricDefinition($cloudId: ID!, $id: ID!, $name: String!, $description: String!, $unit: String!) {
  compass {
    updateMetricDefinition(
      input: {
        id: $id
        cloudId: $cloudId
        name: $name
        description: $description
        format: { suffix: { suffix: $unit } }
      }
    ) {
      success
      errors {
        message
      }
    }
  }
}";

pub const DELETE_METRIC: &str = r"
mutation deleteMetricDefinition($id: ID!) {
  compass {
    deleteMetricDefinition(input: { id: $id }) {
      success
      errors {
        message
      }
    }
  }
}";

pub const SEARCH_METRICS: &str = r"
query searchMetricDefinition($cloudId: ID!) {
  compass {
    metricDefinitions(query: { cloudId: $cloudId, first: 100 }) {
      ... on CompassMetricDefinitionsConnection {
        nodes {
          id
          name
        }
      }
    }
  }
}";

pub const CREATE_SCORECARD: &str = r"
mutation createScorecard($cloudId: ID!, $scorecardDetails: CreateCompassScorecardInput!) {
  compass {
    createScorecard(cloudId: $cloudId, input: $scorecardDetails) {
      success
      scorecardDetails {
        id
        criterias {
          id
          name
        }
      }
      errors {
        message
      }
    }
  }
}";

pub const UPDATE_SCORECARD: &str = r"
mutation updateScorecard($scorecardId: ID!, $scorecardDetails: UpdateCompassScorecardInput!) {
  compass {
    updateScorecard(scorecardId: $scorecardId, input: $scorecardDetails) {
      success
      scorecardDetails {
        id
        criterias {
          id
          name
        }
      }
      errors {
        message
      }
    }
  }
}";

pub const DELETE_SCORECARD: &str = r"
mutation deleteScorecard($id: ID!) {
  compass {
    deleteScorecard(input: { scorecardId: $id }) {
      success
      errors {
        message
      }
    }
  }
}";

pub const SEARCH_SCORECARDS: &str = r"
query searchScorecards($cloudId: ID!) {
  compass {
    scorecards(cloudId: $cloudId, first: 100) {
      ... on CompassScorecardConnection {
        nodes {
          id
          name
          criterias {
            id
            name
          }
        }
      }
    }
  }
}";

pub const ADD_DOCUMENT: &str = r"
mutation addDocument($input: CompassAddDocumentInput!) {
  compass {
    addDocument(input: $input) {
      success
      documentDetails {
        id
      }
      errors {
        message
      }
    }
  }
}";

pub const UPDATE_DOCUMENT: &str = r"
mutation updateDocument($input: CompassUpdateDocumentInput!) {
  compass {
    updateDocument(input: $input) {
      success
      errors {
        message
      }
    }
  }
}";

pub const DELETE_DOCUMENT: &str = r"
mutation deleteDocument($input: CompassDeleteDocumentInput!) {
  compass {
    deleteDocument(input: $input) {
      success
      errors {
        message
      }
    }
  }
}";

pub const CREATE_RELATIONSHIP: &str = r"
mutation createRelationship($dependentId: ID!, $providerId: ID!) {
  compass {
    createRelationship(
      input: { type: DEPENDS_ON, startNodeId: $dependentId, endNodeId: $providerId }
    ) {
      success
      errors {
        message
      }
    }
  }
}";

pub const DELETE_RELATIONSHIP: &str = r"
mutation deleteRelationship($dependentId: ID!, $providerId: ID!) {
  compass {
    deleteRelationship(
      input: { type: DEPENDS_ON, startNodeId: $dependentId, endNodeId: $providerId }
    ) {
      success
      errors {
        message
      }
    }
  }
}";

pub const CREATE_METRIC_SOURCE: &str = r"
mutation createMetricSource($metricId: ID!, $componentId: ID!, $externalId: ID!) {
  compass {
    createMetricSource(
      input: {
        metricDefinitionId: $metricId
        componentId: $componentId
        externalMetricSourceId: $externalId
      }
    ) {
      success
      createdMetricSource {
        id
      }
      errors {
        message
      }
    }
  }
}";

pub const DELETE_METRIC_SOURCE: &str = r"
mutation deleteMetricSource($id: ID!) {
  compass {
    deleteMetricSource(input: { id: $id }) {
      success
      errors {
        message
      }
    }
  }
}";
